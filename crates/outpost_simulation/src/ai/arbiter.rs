//! Decision arbiter: fusion двух каналов восприятия + decision policy
//!
//! `fuse_target` и `decide` — чистые функции (тестируются без App),
//! `run_decision_arbiter` — система, применяющая решение к BehaviorMachine.

use bevy::prelude::*;

use super::behavior::{apply_hook_output, BehaviorKind, BehaviorMachine};
use super::profile::{AgentProfile, EngagementStyle, TargetMemory};
use crate::combat::Weapon;
use crate::components::{Actor, Dead, MovementCommand};
use crate::perception::{HearingPort, PerceivedEntity, PerceptionPort, SightPort};

/// Цель после fusion'а sight + hearing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedTarget {
    pub entity: Entity,
    pub position: Vec3,
    /// Цель есть в sight port (любая фракция)
    pub visible: bool,
    /// Цель есть в hearing port (любая фракция)
    pub audible: bool,
}

/// Event: агент сменил состояние поведения
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorChanged {
    pub agent: Entity,
    pub from: BehaviorKind,
    pub to: BehaviorKind,
}

/// Выбрать цель из двух каналов
///
/// Кандидат канала — первый враг по порядку порта. Оба есть → ближе к агенту,
/// при точном равенстве — видимый. Ambusher не слушает.
pub fn fuse_target(
    own_faction: u64,
    agent_position: Vec3,
    style: EngagementStyle,
    sight: &SightPort,
    hearing: &HearingPort,
) -> Option<FusedTarget> {
    let visible = sight.first_hostile(own_faction);
    let audible = if style.uses_hearing() {
        hearing.first_hostile(own_faction)
    } else {
        None
    };

    let chosen: &PerceivedEntity = match (visible, audible) {
        (Some(seen), Some(heard)) => {
            if agent_position.distance(seen.position) <= agent_position.distance(heard.position) {
                seen
            } else {
                heard
            }
        }
        (Some(seen), None) => seen,
        (None, Some(heard)) => heard,
        (None, None) => return None,
    };

    Some(FusedTarget {
        entity: chosen.entity,
        position: chosen.position,
        visible: sight.contains(chosen.entity),
        audible: hearing.contains(chosen.entity),
    })
}

/// Decision policy (первое совпадение побеждает)
///
/// Мутирует стиль (повышение до Valiant) и память. None = остаться в текущем
/// состоянии (видимая цель вне shoot_range).
pub fn decide(
    profile: &mut AgentProfile,
    memory: &mut TargetMemory,
    target: Option<&FusedTarget>,
    agent_position: Vec3,
    armed: bool,
) -> Option<BehaviorKind> {
    let Some(target) = target else {
        return Some(if memory.is_valid() {
            BehaviorKind::InvestigateLastPosition
        } else if profile.engagement_style == EngagementStyle::Ambusher {
            BehaviorKind::Idle
        } else {
            BehaviorKind::Patrol
        });
    };

    if profile.engagement_style.is_valiant_eligible() {
        profile.engagement_style = EngagementStyle::Valiant;
    }
    let style = profile.engagement_style;

    memory.remember(target.position, style.remembers_targets());

    if !armed || !style.is_ranged() {
        return Some(BehaviorKind::MeleeAttack);
    }

    if !target.visible {
        return Some(if style == EngagementStyle::Guardian {
            BehaviorKind::Shoot
        } else {
            BehaviorKind::Seek
        });
    }

    if agent_position.distance(target.position) < profile.shoot_range {
        Some(if style == EngagementStyle::Valiant {
            BehaviorKind::Valiant
        } else {
            BehaviorKind::Shoot
        })
    } else {
        None
    }
}

/// System: arbiter тик для всех живых агентов
pub fn run_decision_arbiter(
    mut agents: Query<
        (
            Entity,
            &Actor,
            &Transform,
            &mut AgentProfile,
            &mut TargetMemory,
            &mut BehaviorMachine,
            &SightPort,
            &HearingPort,
            &mut MovementCommand,
            Option<&mut Weapon>,
        ),
        Without<Dead>,
    >,
    mut changes: EventWriter<BehaviorChanged>,
) {
    for (
        agent,
        actor,
        transform,
        mut profile,
        mut memory,
        mut machine,
        sight,
        hearing,
        mut movement,
        mut weapon,
    ) in agents.iter_mut()
    {
        let position = transform.translation;
        let style_before = profile.engagement_style;

        let target = fuse_target(
            actor.faction_id,
            position,
            profile.engagement_style,
            sight,
            hearing,
        );
        machine.target = target;

        let next = decide(
            &mut profile,
            &mut memory,
            target.as_ref(),
            position,
            weapon.is_some(),
        );

        if profile.engagement_style != style_before {
            crate::logger::log_info(&format!(
                "⚔️ {:?} engagement style {:?} → {:?}",
                agent, style_before, profile.engagement_style
            ));
        }

        let Some(next) = next else {
            continue;
        };

        if next == BehaviorKind::InvestigateLastPosition {
            machine
                .investigate
                .set_destination(memory.last_known_position());
        }

        let from = machine.active();
        let Some(output) = machine.transition(next) else {
            continue;
        };
        apply_hook_output(&output, &mut movement, weapon.as_deref_mut());

        changes.write(BehaviorChanged {
            agent,
            from,
            to: next,
        });
        crate::logger::log(&format!(
            "🧠 {:?}: {:?} → {:?} (target: {:?})",
            agent,
            from,
            next,
            target.map(|target| target.entity)
        ));
    }
}
