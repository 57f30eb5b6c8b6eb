//! Weapon systems: команды, reload, разрешение выстрелов

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::barrel::{resolve_shot, ShotAttempt, ShotReport};
use crate::combat::damage::{DamageSource, HitLanded};
use crate::combat::hitscan::{HitScanWorld, HitSphere, SphereCollider, SphereWorld, WorldQuery};
use crate::combat::weapon::{FireRejected, ReloadRejected, ReloadStarted, Weapon};
use crate::components::{Dead, Health};
use crate::presentation::{AnimationTrigger, EffectKind, PresentationCue};
use crate::scheduler::{TimerAction, TimerScheduler};
use crate::DeterministicRng;

/// Сколько горит muzzle flash после выстрела (секунды)
pub const MUZZLE_FLASH_DURATION: f64 = 0.2;

/// Команда оружию (от behavior states или host input)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WeaponCommand {
    pub agent: Entity,
    pub kind: WeaponCommandKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponCommandKind {
    /// ShotByShot: один выстрел каждым баррелем
    Fire,
    /// Continuous: зажать trigger
    StartShooting,
    /// Отпустить trigger
    StopShooting,
    Reload,
    /// Точка прицеливания (None = forward агента)
    AimAt(Option<Vec3>),
    /// Host: "Shoot" анимация доиграла
    ShotAnimationFinished,
}

/// Какой звук не настроен
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSlot {
    Shot,
    EmptyClip,
}

/// Diagnostics channel: non-fatal проблемы оружия
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Не настроен asset гильзы
    NoBulletSource,
    /// Не настроен звук
    NoAudioSource(SoundSlot),
    CannotFire(FireRejected),
    Reload(ReloadRejected),
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponDiagnostic {
    pub agent: Entity,
    pub kind: DiagnosticKind,
}

/// Начать reload с cue'ами и диагностикой (общий путь для команд и AI states)
pub fn start_reload(
    agent: Entity,
    weapon: &mut Weapon,
    now: f64,
    scheduler: &mut TimerScheduler,
    cues: &mut EventWriter<PresentationCue>,
    diagnostics: &mut EventWriter<WeaponDiagnostic>,
) -> Option<ReloadStarted> {
    match weapon.reload(agent, now, scheduler) {
        Ok(started) => {
            cues.write(PresentationCue::TriggerAnimation {
                agent,
                trigger: AnimationTrigger::Reload,
            });
            // Reload без звука — штатно, без diagnostic
            if let Some(sound) = weapon.sounds.reload.clone() {
                cues.write(PresentationCue::PlaySound { agent, sound });
            }
            crate::logger::log(&format!(
                "🔄 {:?} reloading: +{} rounds ({}), done at {:.2}s",
                agent,
                started.replenished,
                weapon.ammo_info(),
                started.finishes_at
            ));
            Some(started)
        }
        Err(reason) => {
            crate::logger::log(&format!("{:?} reload rejected: {}", agent, reason));
            diagnostics.write(WeaponDiagnostic {
                agent,
                kind: DiagnosticKind::Reload(reason),
            });
            None
        }
    }
}

fn play_weapon_sound(
    agent: Entity,
    sound: Option<&String>,
    slot: SoundSlot,
    cues: &mut EventWriter<PresentationCue>,
    diagnostics: &mut EventWriter<WeaponDiagnostic>,
) {
    match sound {
        Some(sound) => {
            cues.write(PresentationCue::PlaySound {
                agent,
                sound: sound.clone(),
            });
        }
        None => {
            crate::logger::log_warning(&format!("No audio source for {:?} ({:?})", agent, slot));
            diagnostics.write(WeaponDiagnostic {
                agent,
                kind: DiagnosticKind::NoAudioSource(slot),
            });
        }
    }
}

/// System: применение WeaponCommand
pub fn apply_weapon_commands(
    clock: Res<SimClock>,
    mut scheduler: ResMut<TimerScheduler>,
    mut commands: EventReader<WeaponCommand>,
    mut weapons: Query<&mut Weapon, Without<Dead>>,
    mut cues: EventWriter<PresentationCue>,
    mut diagnostics: EventWriter<WeaponDiagnostic>,
) {
    for command in commands.read() {
        let Ok(mut weapon) = weapons.get_mut(command.agent) else {
            continue;
        };

        match command.kind {
            WeaponCommandKind::Fire => weapon.request_shot(),
            WeaponCommandKind::StartShooting => weapon.start_shooting(),
            WeaponCommandKind::StopShooting => weapon.stop_shooting(),
            WeaponCommandKind::Reload => {
                start_reload(
                    command.agent,
                    &mut weapon,
                    clock.now(),
                    &mut scheduler,
                    &mut cues,
                    &mut diagnostics,
                );
            }
            WeaponCommandKind::AimAt(point) => weapon.aim_point = point,
            WeaponCommandKind::ShotAnimationFinished => weapon.finish_shot_animation(),
        }
    }
}

/// System: разрешение выстрелов всех баррелей
///
/// Continuous баррели с зажатым trigger'ом пробуют стрелять каждый тик,
/// ShotByShot — только по ожидающему запросу (запрос сгорает в этом же тике,
/// даже если cooldown не дал выстрелить).
///
/// Hit-test: `HitScanWorld` от host'а, иначе headless SphereWorld из HitSphere.
pub fn resolve_weapon_fire(
    clock: Res<SimClock>,
    mut rng: ResMut<DeterministicRng>,
    mut scheduler: ResMut<TimerScheduler>,
    host_world: Option<Res<HitScanWorld>>,
    colliders: Query<(Entity, &Transform, &HitSphere, Has<Health>, Has<Dead>)>,
    mut shooters: Query<(Entity, &Transform, &mut Weapon), Without<Dead>>,
    mut cues: EventWriter<PresentationCue>,
    mut diagnostics: EventWriter<WeaponDiagnostic>,
    mut hits: EventWriter<HitLanded>,
) {
    let now = clock.now();

    let sphere_world;
    let world: &dyn WorldQuery = match host_world.as_deref() {
        Some(host) => host.0.as_ref(),
        None => {
            sphere_world = headless_sphere_world(&colliders);
            &sphere_world
        }
    };

    for (agent, transform, mut weapon) in shooters.iter_mut() {
        for barrel_index in 0..weapon.barrels.len() {
            let barrel = &mut weapon.barrels[barrel_index];
            let wants_shot = barrel.continuous_firing || barrel.trigger_pulled;
            barrel.trigger_pulled = false;
            if !wants_shot {
                continue;
            }

            let attempt = resolve_shot(
                &mut weapon,
                barrel_index,
                agent,
                transform,
                now,
                &mut rng.rng,
                world,
            );

            match attempt {
                ShotAttempt::RateLimited => {}
                ShotAttempt::Rejected { reason, notify } => {
                    if !notify {
                        continue;
                    }
                    crate::logger::log(&format!("{:?} cant shoot: {}", agent, reason));
                    diagnostics.write(WeaponDiagnostic {
                        agent,
                        kind: DiagnosticKind::CannotFire(reason),
                    });
                    if reason == FireRejected::EmptyClip {
                        play_weapon_sound(
                            agent,
                            weapon.sounds.empty_clip.as_ref(),
                            SoundSlot::EmptyClip,
                            &mut cues,
                            &mut diagnostics,
                        );
                    }
                }
                ShotAttempt::Fired(report) => {
                    emit_shot_cues(agent, &weapon, &report, &mut cues, &mut diagnostics);

                    if let Some(hit) = report.hit {
                        if let (true, Some(target)) = (report.damaging, hit.entity) {
                            hits.write(HitLanded {
                                attacker: agent,
                                target,
                                damage: report.damage,
                                source: DamageSource::Ranged {
                                    barrel: report.barrel,
                                },
                                point: hit.point,
                            });
                        }
                    }

                    scheduler.schedule(
                        now + MUZZLE_FLASH_DURATION,
                        TimerAction::MuzzleFlashOff {
                            agent,
                            barrel: report.barrel,
                        },
                    );

                    crate::logger::log(&format!(
                        "🔫 {:?} fired barrel {} → {:?} (damaging: {}, ammo {})",
                        agent,
                        report.barrel,
                        report.terminal_point,
                        report.damaging,
                        weapon.ammo_info()
                    ));
                }
            }
        }
    }
}

/// Cue'и успешного выстрела: звук, гильза, анимация, impact, tracer, muzzle flash
fn emit_shot_cues(
    agent: Entity,
    weapon: &Weapon,
    report: &ShotReport,
    cues: &mut EventWriter<PresentationCue>,
    diagnostics: &mut EventWriter<WeaponDiagnostic>,
) {
    play_weapon_sound(
        agent,
        weapon.sounds.shot.as_ref(),
        SoundSlot::Shot,
        cues,
        diagnostics,
    );

    match &weapon.casing_effect {
        Some(asset) => {
            cues.write(PresentationCue::SpawnEffect {
                effect: EffectKind::ShellCasing {
                    asset: asset.clone(),
                },
                position: report.muzzle,
                normal: Vec3::Y,
            });
        }
        None => {
            crate::logger::log_warning(&format!("No bullet source configured for {:?}", agent));
            diagnostics.write(WeaponDiagnostic {
                agent,
                kind: DiagnosticKind::NoBulletSource,
            });
        }
    }

    if report.play_animation {
        cues.write(PresentationCue::TriggerAnimation {
            agent,
            trigger: AnimationTrigger::Shoot,
        });
    }

    if let Some(hit) = report.hit {
        let effect = if report.damaging {
            EffectKind::DamagingImpact
        } else {
            EffectKind::InertImpact
        };
        cues.write(PresentationCue::SpawnEffect {
            effect,
            position: hit.point,
            normal: hit.normal,
        });
    }

    cues.write(PresentationCue::Tracer {
        from: report.muzzle,
        to: report.terminal_point,
    });
    cues.write(PresentationCue::MuzzleFlash {
        agent,
        barrel: report.barrel,
        lit: true,
    });
}

/// Headless hit-test world из HitSphere компонентов (мёртвые — не damageable)
fn headless_sphere_world(
    colliders: &Query<(Entity, &Transform, &HitSphere, Has<Health>, Has<Dead>)>,
) -> SphereWorld {
    let mut world = SphereWorld::default();
    for (entity, transform, sphere, has_health, dead) in colliders.iter() {
        world.push(SphereCollider {
            entity: Some(entity),
            center: transform.translation,
            radius: sphere.radius,
            layers: sphere.layers,
            damageable: has_health && !dead,
        });
    }
    world
}
