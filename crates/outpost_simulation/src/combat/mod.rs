//! Combat module: weapon/barrel hit-scan state machine + damage
//!
//! ECS ответственность:
//! - Weapon state: ammo, reload, cooldown барреля, latch'и
//! - Shot resolution: dispersion, raycast через WorldQuery, damage events
//! - Events: HitLanded → DamageDealt / EntityDied, WeaponDiagnostic
//!
//! Host ответственность:
//! - Физика (WorldQuery implementation, либо headless SphereWorld)
//! - Эффекты, звуки, анимации (читает PresentationCue)

use bevy::prelude::*;

pub mod barrel;
pub mod damage;
pub mod hitscan;
pub mod systems;
pub mod weapon;

// Re-export основных типов
pub use barrel::{resolve_shot, Barrel, MuzzlePose, ShotAttempt, ShotReport};
pub use damage::{apply_hit_damage, DamageDealt, DamageSource, EntityDied, HitLanded};
pub use hitscan::{
    CollisionFilter, HitScanWorld, HitSphere, RayHit, SphereCollider, SphereWorld, WorldQuery,
    ALL_LAYERS,
};
pub use systems::{
    apply_weapon_commands, resolve_weapon_fire, start_reload, DiagnosticKind, SoundSlot,
    WeaponCommand, WeaponCommandKind, WeaponDiagnostic, MUZZLE_FLASH_DURATION,
};
pub use weapon::{FireRejected, ReloadRejected, ReloadStarted, ShotMode, Weapon, WeaponSounds};

use crate::{SimulationSet, SimulationTick};

/// Combat Plugin
///
/// Регистрирует combat события и системы в `SimulationTick`.
///
/// Порядок выполнения (внутри SimulationSet::Combat):
/// 1. apply_weapon_commands — Fire/StartShooting/StopShooting/Reload
/// 2. resolve_weapon_fire — shot resolution всех баррелей
/// 3. apply_hit_damage — HitLanded → Health
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WeaponCommand>()
            .add_event::<WeaponDiagnostic>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            SimulationTick,
            (apply_weapon_commands, resolve_weapon_fire, apply_hit_damage)
                .chain()
                .in_set(SimulationSet::Combat),
        );
    }
}
