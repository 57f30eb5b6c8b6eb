//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: фракция и здоровье (Actor, Health, Dead)
//! - movement: movement intent для host'а (MovementCommand, MovementSpeed)
//!
//! AI/combat/perception компоненты живут в своих модулях.

pub mod actor;
pub mod movement;

pub use actor::*;
pub use movement::*;
