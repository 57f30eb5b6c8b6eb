//! Per-state логика (тикает только активное состояние)
//!
//! Arbiter уже принял решение в этом тике; здесь активное состояние
//! выполняет свою работу: движение, стрельба, melee удары, arrival detection.

use bevy::prelude::*;

use super::arbiter::FusedTarget;
use super::behavior::{BehaviorKind, BehaviorMachine};
use super::profile::{AgentProfile, TargetMemory};
use crate::clock::SimClock;
use crate::combat::{start_reload, DamageSource, HitLanded, ShotMode, Weapon, WeaponDiagnostic};
use crate::components::{horizontal_distance, Dead, MovementCommand};
use crate::presentation::{AnimationTrigger, PresentationCue};
use crate::scheduler::TimerScheduler;

/// Event: InvestigateLastPosition дошёл до запомненной точки
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastPositionReached {
    pub agent: Entity,
}

/// Записать MovementCommand только если он изменился (без лишнего change detection)
fn set_movement(movement: &mut Mut<MovementCommand>, command: MovementCommand) {
    if **movement != command {
        **movement = command;
    }
}

/// System: логика активного состояния каждого агента
pub fn run_behavior_states(
    clock: Res<SimClock>,
    mut scheduler: ResMut<TimerScheduler>,
    mut agents: Query<
        (
            Entity,
            &Transform,
            &AgentProfile,
            &mut BehaviorMachine,
            &mut MovementCommand,
            Option<&mut Weapon>,
        ),
        Without<Dead>,
    >,
    mut cues: EventWriter<PresentationCue>,
    mut diagnostics: EventWriter<WeaponDiagnostic>,
    mut hits: EventWriter<HitLanded>,
    mut arrivals: EventWriter<LastPositionReached>,
) {
    let now = clock.now();

    for (agent, transform, profile, mut machine, mut movement, mut weapon) in agents.iter_mut() {
        let position = transform.translation;
        let target = machine.target;

        match machine.active() {
            BehaviorKind::Idle => {}

            BehaviorKind::Patrol => {
                let Some(mut waypoint) = machine.patrol.current() else {
                    continue;
                };
                if horizontal_distance(position, waypoint) <= machine.patrol.arrival_radius {
                    if let Some(next) = machine.patrol.advance() {
                        waypoint = next;
                    }
                }
                set_movement(&mut movement, MovementCommand::MoveToPosition { target: waypoint });
            }

            BehaviorKind::Seek => {
                let command = match target {
                    Some(target) => MovementCommand::FollowEntity {
                        target: target.entity,
                    },
                    None => MovementCommand::Stop,
                };
                set_movement(&mut movement, command);
            }

            BehaviorKind::MeleeAttack => {
                let Some(target) = target else {
                    continue;
                };

                if horizontal_distance(position, target.position) > machine.melee.reach {
                    set_movement(
                        &mut movement,
                        MovementCommand::FollowEntity {
                            target: target.entity,
                        },
                    );
                    continue;
                }

                set_movement(&mut movement, MovementCommand::Stop);
                if now < machine.melee.next_strike_at {
                    continue;
                }

                machine.melee.next_strike_at = now + machine.melee.interval;
                hits.write(HitLanded {
                    attacker: agent,
                    target: target.entity,
                    damage: machine.melee.damage,
                    source: DamageSource::Melee,
                    point: target.position,
                });
                cues.write(PresentationCue::TriggerAnimation {
                    agent,
                    trigger: AnimationTrigger::MeleeStrike,
                });
            }

            kind @ (BehaviorKind::Shoot | BehaviorKind::Valiant) => {
                let (Some(target), Some(weapon)) = (target, weapon.as_deref_mut()) else {
                    continue;
                };

                engage(
                    agent,
                    weapon,
                    &target,
                    now,
                    &mut scheduler,
                    &mut cues,
                    &mut diagnostics,
                );

                let command = if kind == BehaviorKind::Valiant
                    && horizontal_distance(position, target.position) > profile.valiant_range
                {
                    MovementCommand::FollowEntity {
                        target: target.entity,
                    }
                } else {
                    MovementCommand::Stop
                };
                set_movement(&mut movement, command);
            }

            BehaviorKind::InvestigateLastPosition => {
                if machine.investigate.is_reached() {
                    continue;
                }

                let destination = machine.investigate.destination();
                if horizontal_distance(position, destination) <= machine.investigate.arrival_radius {
                    machine.investigate.mark_reached();
                    set_movement(&mut movement, MovementCommand::Stop);
                    arrivals.write(LastPositionReached { agent });
                    crate::logger::log(&format!(
                        "🔍 {:?} reached last known position {:?}",
                        agent, destination
                    ));
                } else {
                    set_movement(&mut movement, MovementCommand::MoveToPosition { target: destination });
                }
            }
        }
    }
}

/// Стрельба по цели: прицел, авто-reload пустой обоймы, запрос выстрела
fn engage(
    agent: Entity,
    weapon: &mut Weapon,
    target: &FusedTarget,
    now: f64,
    scheduler: &mut TimerScheduler,
    cues: &mut EventWriter<PresentationCue>,
    diagnostics: &mut EventWriter<WeaponDiagnostic>,
) {
    weapon.aim_point = Some(target.position);

    if weapon.is_clip_empty() && weapon.can_reload() {
        start_reload(agent, weapon, now, scheduler, cues, diagnostics);
        return;
    }

    // Continuous: trigger зажат enter hook'ом
    if weapon.shot_mode == ShotMode::ShotByShot {
        weapon.request_shot();
    }
}

/// System: сигнал arrival → память цели невалидна
pub fn clear_memory_on_arrival(
    mut arrivals: EventReader<LastPositionReached>,
    mut memories: Query<&mut TargetMemory>,
) {
    for arrival in arrivals.read() {
        if let Ok(mut memory) = memories.get_mut(arrival.agent) {
            memory.forget();
        }
    }
}
