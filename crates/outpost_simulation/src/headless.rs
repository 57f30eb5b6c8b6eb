//! Headless host: proximity senses + простая locomotion
//!
//! В игре порты восприятия пишет VisionCone/Audition, а MovementCommand
//! исполняет NavigationAgent. Для runner'а и интеграционных тестов
//! этот plugin заменяет host: сфера видимости/слышимости и движение по прямой.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::components::{horizontal_distance, Actor, Dead, MovementCommand, MovementSpeed};
use crate::perception::{apply_perception_events, HearingPort, PerceivedEntity, PerceptionPort, SightPort};
use crate::{SimulationSet, SimulationTick};

/// На каком расстоянии FollowEntity перестаёт сближаться (метры)
pub const FOLLOW_DISTANCE: f32 = 1.0;

/// Радиусы headless восприятия
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Senses {
    pub sight_radius: f32,
    pub hearing_radius: f32,
}

impl Default for Senses {
    fn default() -> Self {
        Self {
            sight_radius: 20.0,
            hearing_radius: 8.0,
        }
    }
}

/// System: пересобрать порты по дистанции (ближайшие первыми, tie → меньший index)
pub fn sense_proximity(
    mut observers: Query<(Entity, &Transform, &Senses, &mut SightPort, &mut HearingPort), Without<Dead>>,
    targets: Query<(Entity, &Actor, &Transform), Without<Dead>>,
) {
    for (observer, transform, senses, mut sight, mut hearing) in observers.iter_mut() {
        let position = transform.translation;

        let mut nearby: Vec<(f32, PerceivedEntity)> = targets
            .iter()
            .filter(|(entity, _, _)| *entity != observer)
            .map(|(entity, actor, target)| {
                (
                    position.distance(target.translation),
                    PerceivedEntity::new(entity, actor.faction_id, target.translation),
                )
            })
            .collect();
        nearby.sort_by(|(a_dist, a), (b_dist, b)| {
            a_dist
                .total_cmp(b_dist)
                .then(a.entity.index().cmp(&b.entity.index()))
        });

        sight.clear();
        hearing.clear();
        for (distance, perceived) in nearby {
            if distance <= senses.sight_radius {
                sight.insert(perceived);
            }
            if distance <= senses.hearing_radius {
                hearing.insert(perceived);
            }
        }
    }
}

/// System: движение по прямой к цели MovementCommand
pub fn drive_locomotion(
    clock: Res<SimClock>,
    agents: Query<(Entity, &MovementCommand, &MovementSpeed), Without<Dead>>,
    mut transforms: Query<&mut Transform>,
) {
    let step = clock.step as f32;

    for (agent, command, speed) in agents.iter() {
        let (goal, stop_distance) = match command {
            MovementCommand::MoveToPosition { target } => (*target, 0.0),
            MovementCommand::FollowEntity { target } => {
                let Ok(followed) = transforms.get(*target) else {
                    continue;
                };
                (followed.translation, FOLLOW_DISTANCE)
            }
            MovementCommand::Idle | MovementCommand::Stop => continue,
        };

        let Ok(mut transform) = transforms.get_mut(agent) else {
            continue;
        };

        let distance = horizontal_distance(transform.translation, goal);
        if distance <= stop_distance {
            continue;
        }

        let offset = goal - transform.translation;
        let direction = Vec3::new(offset.x, 0.0, offset.z) / distance;
        let travel = (speed.speed * step).min(distance - stop_distance);
        transform.translation += direction * travel;
        transform.look_to(direction, Vec3::Y);
    }
}

/// Headless host plugin (senses + locomotion)
pub struct HeadlessHostPlugin;

impl Plugin for HeadlessHostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            SimulationTick,
            (
                sense_proximity
                    .in_set(SimulationSet::Perception)
                    .before(apply_perception_events),
                drive_locomotion.in_set(SimulationSet::Host),
            ),
        );
    }
}
