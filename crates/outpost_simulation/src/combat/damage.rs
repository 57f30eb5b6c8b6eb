//! Damage application
//!
//! Источники урона (hit-scan попадание, melee удар) пишут HitLanded,
//! `apply_hit_damage` применяет его к Health и генерирует
//! DamageDealt / EntityDied для UI, звуков, эффектов.

use bevy::prelude::*;

use crate::components::{Dead, Health};

/// Откуда пришёл урон
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Hit-scan выстрел барреля
    Ranged { barrel: usize },
    Melee,
}

/// Event: попадание по damageable цели (ещё не применено)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HitLanded {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
    pub point: Vec3,
}

/// Event: урон нанесен
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    /// Фактически снятое HP (overkill обрезан)
    pub damage: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Event: entity умер (health → 0)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Система: HitLanded → Health
///
/// Self-hit отбрасывается (raycast исключает стрелка, но host-world может и не исключить).
/// Умершим добавляется маркер Dead — AI и оружие для них больше не тикают.
pub fn apply_hit_damage(
    mut commands: Commands,
    mut hits: EventReader<HitLanded>,
    mut targets: Query<&mut Health>,
    mut damage_events: EventWriter<DamageDealt>,
    mut death_events: EventWriter<EntityDied>,
) {
    for hit in hits.read() {
        if hit.attacker == hit.target {
            crate::logger::log_warning(&format!(
                "⚠️ SELF-HIT DETECTED! Entity {:?} hit itself, ignored",
                hit.attacker
            ));
            continue;
        }

        let Ok(mut health) = targets.get_mut(hit.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let applied = health.apply_damage(hit.damage);
        let target_died = !health.is_alive();

        damage_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: applied,
            source: hit.source,
            target_died,
        });

        crate::logger::log(&format!(
            "💥 {:?} hit {:?} for {} ({:?}), HP {} → {}",
            hit.attacker,
            hit.target,
            applied,
            hit.source,
            health.current + applied,
            health.current
        ));

        if target_died {
            death_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
            });
            commands.entity(hit.target).insert(Dead);
            crate::logger::log_info(&format!(
                "☠️ {:?} killed by {:?}",
                hit.target, hit.attacker
            ));
        }
    }
}
