//! Perception systems: host events → ports, refresh позиций

use bevy::prelude::*;

use super::{HearingPort, PerceivedEntity, PerceptionEvent, PerceptionPort, SightPort};
use crate::components::{Actor, Health};

/// System: применение PerceptionEvent к портам
///
/// Фракции НЕ фильтруем: порт содержит всех (союзников тоже),
/// враг/не враг решает arbiter.
pub fn apply_perception_events(
    mut events: EventReader<PerceptionEvent>,
    mut observers: Query<(Option<&mut SightPort>, Option<&mut HearingPort>)>,
    targets: Query<(&Actor, &Transform)>,
) {
    for event in events.read() {
        let Ok((sight, hearing)) = observers.get_mut(event.observer()) else {
            continue;
        };

        match *event {
            PerceptionEvent::Seen { target, .. } => {
                let (Some(mut sight), Ok((actor, transform))) = (sight, targets.get(target)) else {
                    continue;
                };
                if sight.insert(PerceivedEntity::new(target, actor.faction_id, transform.translation)) {
                    crate::logger::log(&format!(
                        "👁️ {:?} sees {:?} (faction {})",
                        event.observer(),
                        target,
                        actor.faction_id
                    ));
                }
            }
            PerceptionEvent::Unseen { target, .. } => {
                if let Some(mut sight) = sight {
                    sight.remove(target);
                }
            }
            PerceptionEvent::Heard { target, .. } => {
                let (Some(mut hearing), Ok((actor, transform))) = (hearing, targets.get(target))
                else {
                    continue;
                };
                if hearing.insert(PerceivedEntity::new(target, actor.faction_id, transform.translation)) {
                    crate::logger::log(&format!(
                        "👂 {:?} hears {:?} (faction {})",
                        event.observer(),
                        target,
                        actor.faction_id
                    ));
                }
            }
            PerceptionEvent::Unheard { target, .. } => {
                if let Some(mut hearing) = hearing {
                    hearing.remove(target);
                }
            }
        }
    }
}

/// System: обновление позиций в портах + очистка despawned/мёртвых
///
/// Host не обязан присылать Unseen при смерти цели — чистим сами.
pub fn refresh_perceived_positions(
    mut sights: Query<&mut SightPort>,
    mut hearings: Query<&mut HearingPort>,
    targets: Query<(&Transform, Option<&Health>)>,
) {
    let refresh = |entries: &mut Vec<PerceivedEntity>| {
        entries.retain_mut(|perceived| match targets.get(perceived.entity) {
            Ok((transform, health)) => {
                perceived.position = transform.translation;
                health.map_or(true, Health::is_alive)
            }
            Err(_) => false,
        });
    };

    for mut sight in sights.iter_mut() {
        refresh(sight.entries_mut());
    }
    for mut hearing in hearings.iter_mut() {
        refresh(hearing.entries_mut());
    }
}
