//! Simulation clock (детерминистичное время тика)
//!
//! Не зависит от `Time<Virtual>`: каждый прогон `SimulationTick` сдвигает
//! время ровно на `step` секунд. Все таймеры (reload, cooldown барреля,
//! muzzle flash) считаются от `SimClock::now()`.

use bevy::prelude::*;

/// Глобальные часы симуляции
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Номер текущего тика (0 = ещё ни одного тика)
    pub tick: u64,
    /// Прошедшее симуляционное время (секунды)
    pub elapsed: f64,
    /// Шаг одного тика (секунды)
    pub step: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::from_hz(60.0)
    }
}

impl SimClock {
    pub fn from_hz(hz: f64) -> Self {
        Self::with_step(1.0 / hz)
    }

    pub fn with_step(step: f64) -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            step,
        }
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        // От номера тика, без накопления ошибки
        self.elapsed = self.tick as f64 * self.step;
    }
}

/// System: сдвиг часов (запускается ПЕРВЫМ в SimulationTick)
pub fn advance_sim_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}
