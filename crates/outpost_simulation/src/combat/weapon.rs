//! Weapon — ammo/reload state machine
//!
//! Архитектура:
//! - Weapon владеет своими Barrel'ами (cadence, dispersion, range, damage)
//! - Ammo: clip + spare clips, reload меняет ammo СРАЗУ в момент старта,
//!   `reloading` снимается таймером через `reload_duration` секунд
//! - Все отказы (reload/fire) — non-fatal: Result наружу из метода,
//!   система логирует и шлёт WeaponDiagnostic, тик продолжается

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::barrel::Barrel;
use crate::scheduler::{TimerAction, TimerScheduler};

/// Режим стрельбы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShotMode {
    /// Один выстрел на явный запрос (Fire)
    #[default]
    ShotByShot,
    /// Пока зажат trigger — стреляем каждый тик (с учётом cooldown)
    Continuous,
}

/// Почему reload не начался
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReloadRejected {
    #[error("no ammo clips")]
    NoAmmoClips,
    #[error("ammo is full")]
    AmmoFull,
    #[error("reload already in progress")]
    AlreadyReloading,
}

/// Почему выстрел не состоялся
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FireRejected {
    #[error("cannot fire: reloading")]
    Reloading,
    #[error("cannot fire: clip is empty")]
    EmptyClip,
}

/// Успешно начатый reload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReloadStarted {
    /// Сколько патронов добавлено в clip
    pub replenished: u32,
    /// Когда снимется `reloading`
    pub finishes_at: f64,
}

/// Asset keys звуков (None = не настроено → diagnostic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSounds {
    pub shot: Option<String>,
    pub reload: Option<String>,
    pub empty_clip: Option<String>,
}

/// Оружие агента
///
/// Инвариант: 0 ≤ ammo_in_clip ≤ clip_capacity (adjust_ammo не клампит сверху —
/// вызывающий обязан уважать capacity).
#[derive(Component, Debug, Clone)]
pub struct Weapon {
    pub shot_mode: ShotMode,

    ammo_in_clip: u32,
    spare_clips: u32,
    clip_capacity: u32,

    /// Длительность reload (секунды)
    pub reload_duration: f64,
    reloading: bool,

    /// Busy flag: идёт синхронное разрешение выстрела (reentrancy guard)
    pub(crate) shooting: bool,

    /// ShotByShot override: разрешить выстрел даже когда `can_fire() == false`
    pub force_fire: bool,

    /// "Cannot shoot" уже сообщали в текущей серии отказов
    cannot_fire_latched: bool,

    /// ShotByShot: "Shoot" анимация уже запущена, ждём finish от host'а
    shot_animation_playing: bool,

    /// Куда целимся (None = вдоль forward агента)
    pub aim_point: Option<Vec3>,

    pub sounds: WeaponSounds,

    /// Asset гильзы (None = "no bullet source" diagnostic при каждом выстреле)
    pub casing_effect: Option<String>,

    pub barrels: Vec<Barrel>,
}

impl Weapon {
    pub fn new(shot_mode: ShotMode, clip_capacity: u32, ammo_in_clip: u32, spare_clips: u32) -> Self {
        Self {
            shot_mode,
            ammo_in_clip: ammo_in_clip.min(clip_capacity),
            spare_clips,
            clip_capacity,
            reload_duration: 2.0,
            reloading: false,
            shooting: false,
            force_fire: false,
            cannot_fire_latched: false,
            shot_animation_playing: false,
            aim_point: None,
            sounds: WeaponSounds::default(),
            casing_effect: None,
            barrels: Vec::new(),
        }
    }

    pub fn with_barrel(mut self, barrel: Barrel) -> Self {
        self.barrels.push(barrel);
        self
    }

    pub fn with_reload_duration(mut self, seconds: f64) -> Self {
        self.reload_duration = seconds;
        self
    }

    // === Ammo ===

    pub fn ammo_in_clip(&self) -> u32 {
        self.ammo_in_clip
    }

    pub fn spare_clips(&self) -> u32 {
        self.spare_clips
    }

    pub fn clip_capacity(&self) -> u32 {
        self.clip_capacity
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn is_shooting(&self) -> bool {
        self.shooting
    }

    pub fn has_ammo(&self) -> bool {
        self.ammo_in_clip > 0
    }

    pub fn is_clip_empty(&self) -> bool {
        self.ammo_in_clip == 0
    }

    /// Clip полон (или переполнен через `adjust_ammo`)
    pub fn is_ammo_full(&self) -> bool {
        self.ammo_in_clip >= self.clip_capacity
    }

    pub fn has_clips(&self) -> bool {
        self.spare_clips > 0
    }

    /// "ammo/clips" для HUD/логов
    pub fn ammo_info(&self) -> String {
        format!("{}/{}", self.ammo_in_clip, self.spare_clips)
    }

    pub fn can_fire(&self) -> bool {
        self.has_ammo() && !self.reloading
    }

    pub fn can_reload(&self) -> bool {
        self.has_clips() && !self.is_ammo_full() && !self.reloading
    }

    /// Причина по которой нельзя стрелять (None = можно)
    pub fn fire_blocker(&self) -> Option<FireRejected> {
        if self.reloading {
            Some(FireRejected::Reloading)
        } else if self.is_clip_empty() {
            Some(FireRejected::EmptyClip)
        } else {
            None
        }
    }

    /// Добавить/убрать патроны в clip
    ///
    /// Не клампит сверху (capacity — ответственность вызывающего),
    /// снизу насыщается на 0.
    pub fn adjust_ammo(&mut self, delta: i32) {
        self.ammo_in_clip = self.ammo_in_clip.saturating_add_signed(delta);
    }

    /// Начать reload
    ///
    /// Ammo пополняется СРАЗУ (capacity − current), spare clip расходуется,
    /// `reloading` снимется таймером `FinishReload` через `reload_duration`.
    pub fn reload(
        &mut self,
        agent: Entity,
        now: f64,
        scheduler: &mut TimerScheduler,
    ) -> Result<ReloadStarted, ReloadRejected> {
        if !self.can_reload() {
            return Err(if !self.has_clips() {
                ReloadRejected::NoAmmoClips
            } else if self.is_ammo_full() {
                ReloadRejected::AmmoFull
            } else {
                ReloadRejected::AlreadyReloading
            });
        }

        self.reloading = true;
        let replenished = self.clip_capacity.saturating_sub(self.ammo_in_clip);
        self.spare_clips -= 1;
        self.ammo_in_clip += replenished;
        // Новая обойма — новая серия отказов
        self.cannot_fire_latched = false;

        let finishes_at = now + self.reload_duration;
        scheduler.schedule(finishes_at, TimerAction::FinishReload { agent });

        Ok(ReloadStarted {
            replenished,
            finishes_at,
        })
    }

    /// Вызывается таймером FinishReload
    pub fn finish_reload(&mut self) {
        self.reloading = false;
    }

    // === Trigger ===

    /// Continuous: зажать trigger на всех баррелях (ShotByShot игнорирует)
    pub fn start_shooting(&mut self) {
        if self.shot_mode != ShotMode::Continuous {
            return;
        }
        for barrel in self.barrels.iter_mut() {
            barrel.continuous_firing = true;
        }
    }

    /// Отпустить trigger (сбрасывает и latch "cannot shoot")
    pub fn stop_shooting(&mut self) {
        for barrel in self.barrels.iter_mut() {
            barrel.continuous_firing = false;
            barrel.trigger_pulled = false;
        }
        self.cannot_fire_latched = false;
    }

    /// ShotByShot: один запрос выстрела на каждый баррель
    pub fn request_shot(&mut self) {
        for barrel in self.barrels.iter_mut() {
            barrel.trigger_pulled = true;
        }
    }

    pub fn is_trigger_held(&self) -> bool {
        self.barrels.iter().any(|barrel| barrel.continuous_firing)
    }

    /// Host: "Shoot" анимация доиграла (ShotByShot может запустить следующую)
    pub fn finish_shot_animation(&mut self) {
        self.shot_animation_playing = false;
    }

    /// Legality check выстрела (шаг 2 shot resolution)
    ///
    /// Возвращает Err(reason, notify): notify == true только для ПЕРВОГО
    /// отказа в серии (edge-triggered latch).
    pub(crate) fn check_fire_legality(&mut self) -> Result<(), (FireRejected, bool)> {
        let legal = match self.shot_mode {
            ShotMode::Continuous => self.can_fire(),
            ShotMode::ShotByShot => self.can_fire() || self.force_fire,
        };

        if legal {
            self.cannot_fire_latched = false;
            return Ok(());
        }

        let reason = self.fire_blocker().unwrap_or(FireRejected::EmptyClip);
        let notify = !self.cannot_fire_latched;
        self.cannot_fire_latched = true;
        Err((reason, notify))
    }

    /// Нужно ли дёрнуть "Shoot" анимацию на этом выстреле
    pub(crate) fn take_shot_animation(&mut self) -> bool {
        match self.shot_mode {
            ShotMode::Continuous => true,
            ShotMode::ShotByShot => {
                if self.shot_animation_playing {
                    false
                } else {
                    self.shot_animation_playing = true;
                    true
                }
            }
        }
    }
}
