//! Spawn агентов из blueprint'ов
//!
//! Вся проводка явная: spawn сам создаёт профиль, порты, state machine и
//! оружие, и сразу входит в стартовое состояние.

use bevy::prelude::*;

use crate::ai::{apply_hook_output, BehaviorMachine, PatrolRoute, TargetMemory};
use crate::combat::{HitSphere, ALL_LAYERS};
use crate::components::{Actor, Health, MovementCommand, MovementSpeed};
use crate::config::{AgentBlueprint, ConfigError};
use crate::perception::{HearingPort, SightPort};

/// Создать полностью собранного агента
///
/// Blueprint валидируется; при ошибке мир не меняется.
pub fn spawn_agent(world: &mut World, blueprint: &AgentBlueprint) -> Result<Entity, ConfigError> {
    blueprint.validate()?;

    let mut weapon = blueprint.weapon.as_ref().map(|config| config.build()).transpose()?;

    let route = PatrolRoute::new(
        blueprint
            .patrol_route
            .iter()
            .copied()
            .map(Vec3::from_array)
            .collect(),
    );
    let mut machine = BehaviorMachine::new(blueprint.start_state)
        .with_patrol_route(route)
        .with_melee(blueprint.melee.build());

    let mut movement = MovementCommand::default();
    let start = machine.enter_start_state();
    apply_hook_output(&start, &mut movement, weapon.as_mut());

    let transform = Transform::from_translation(Vec3::from_array(blueprint.position))
        .with_rotation(Quat::from_rotation_y(blueprint.yaw_degrees.to_radians()));

    let mut agent = world.spawn((
        transform,
        Actor::new(blueprint.faction_id),
        Health::new(blueprint.max_health),
        HitSphere {
            radius: blueprint.hit_radius,
            layers: ALL_LAYERS,
        },
        blueprint.profile.clone(),
        TargetMemory::default(),
        machine,
        SightPort::default(),
        HearingPort::default(),
        movement,
        MovementSpeed {
            speed: blueprint.movement_speed,
        },
    ));

    if let Some(weapon) = weapon {
        agent.insert(weapon);
    }
    if let Some(senses) = blueprint.senses {
        agent.insert(senses);
    }

    let entity = agent.id();
    crate::logger::log_info(&format!(
        "✅ Spawned '{}' {:?} (faction {}, {:?}, start {:?})",
        blueprint.name,
        entity,
        blueprint.faction_id,
        blueprint.profile.engagement_style,
        blueprint.start_state
    ));

    Ok(entity)
}

/// Статичное препятствие (не damageable): стены, ящики
pub fn spawn_obstacle(world: &mut World, position: Vec3, radius: f32) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            HitSphere {
                radius,
                layers: ALL_LAYERS,
            },
        ))
        .id()
}
