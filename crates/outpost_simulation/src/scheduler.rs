//! Timer scheduler — замена coroutine'ам (reload, muzzle flash)
//!
//! Запись = (expires_at, action). `dispatch_due_timers` в начале каждого тика
//! забирает все истёкшие записи и применяет их. Никакой блокировки потоков:
//! пока таймер ждёт, остальные агенты тикают как обычно.
//!
//! Отмены нет — конфликтующие запросы отсекаются gating-проверками
//! (`can_fire`, `can_reload`, busy flag), а не удалением таймера.

use bevy::prelude::*;

use crate::combat::Weapon;
use crate::presentation::PresentationCue;

/// Что сделать когда таймер истёк
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Reload закончился → `reloading = false`
    FinishReload { agent: Entity },
    /// Погасить muzzle flash барреля
    MuzzleFlashOff { agent: Entity, barrel: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTimer {
    pub expires_at: f64,
    /// Порядок постановки (tie-break для одинакового expires_at)
    pub seq: u64,
    pub action: TimerAction,
}

/// Очередь отложенных действий (одна на мир)
#[derive(Resource, Debug, Default)]
pub struct TimerScheduler {
    timers: Vec<ScheduledTimer>,
    next_seq: u64,
}

impl TimerScheduler {
    pub fn schedule(&mut self, expires_at: f64, action: TimerAction) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(ScheduledTimer {
            expires_at,
            seq,
            action,
        });
        seq
    }

    /// Забрать истёкшие таймеры (expires_at <= now) в порядке истечения
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledTimer> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .timers
            .drain(..)
            .partition(|timer| timer.expires_at <= now);
        self.timers = pending;

        due.sort_by(|a, b| {
            a.expires_at
                .total_cmp(&b.expires_at)
                .then(a.seq.cmp(&b.seq))
        });
        due
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_pending(&self, action: &TimerAction) -> bool {
        self.timers.iter().any(|timer| timer.action == *action)
    }
}

/// System: применение истёкших таймеров
///
/// Если агент уже despawned — таймер просто выбрасывается.
pub fn dispatch_due_timers(
    clock: Res<crate::SimClock>,
    mut scheduler: ResMut<TimerScheduler>,
    mut weapons: Query<&mut Weapon>,
    mut cues: EventWriter<PresentationCue>,
) {
    for timer in scheduler.take_due(clock.now()) {
        match timer.action {
            TimerAction::FinishReload { agent } => {
                let Ok(mut weapon) = weapons.get_mut(agent) else {
                    continue;
                };
                weapon.finish_reload();
                crate::logger::log(&format!(
                    "🔄 {:?} reload finished ({})",
                    agent,
                    weapon.ammo_info()
                ));
            }
            TimerAction::MuzzleFlashOff { agent, barrel } => {
                let Ok(mut weapon) = weapons.get_mut(agent) else {
                    continue;
                };
                if let Some(barrel_state) = weapon.barrels.get_mut(barrel) {
                    barrel_state.muzzle_flash_lit = false;
                }
                cues.write(PresentationCue::MuzzleFlash {
                    agent,
                    barrel,
                    lit: false,
                });
            }
        }
    }
}
