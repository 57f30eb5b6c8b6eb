//! Perception module (Sight + Hearing ports)
//!
//! Host (VisionCone, audition) либо пишет порты напрямую,
//! либо шлёт PerceptionEvent — core сам поддерживает порядок в портах.

use bevy::prelude::*;

pub mod ports;
pub mod systems;

pub use ports::{HearingPort, PerceivedEntity, PerceptionPort, SightPort};
pub use systems::{apply_perception_events, refresh_perceived_positions};

/// Perception события от host'а
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerceptionEvent {
    /// target вошёл в поле зрения observer'а
    Seen { observer: Entity, target: Entity },
    /// target вышел из поля зрения
    Unseen { observer: Entity, target: Entity },
    /// observer услышал target
    Heard { observer: Entity, target: Entity },
    /// target больше не слышен
    Unheard { observer: Entity, target: Entity },
}

impl PerceptionEvent {
    pub fn observer(&self) -> Entity {
        match *self {
            PerceptionEvent::Seen { observer, .. }
            | PerceptionEvent::Unseen { observer, .. }
            | PerceptionEvent::Heard { observer, .. }
            | PerceptionEvent::Unheard { observer, .. } => observer,
        }
    }
}
