//! Базовые компоненты акторов: Actor, Health, Dead

use bevy::prelude::*;

/// Актор (NPC, игрок, турель) — всё что имеет фракцию и может быть целью
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[require(Health)]
pub struct Actor {
    /// Interned ID фракции ("Enemy", "Player", ...). Разные id = враги
    pub faction_id: u64,
}

impl Actor {
    pub fn new(faction_id: u64) -> Self {
        Self { faction_id }
    }

    pub fn is_hostile_to(&self, faction_id: u64) -> bool {
        self.faction_id != faction_id
    }
}

/// Здоровье актора (Damageable Target)
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Применить урон, вернуть фактически снятое HP
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.current);
        self.current -= applied;
        applied
    }
}

/// Маркер: актор мёртв (Health == 0). AI и оружие для него больше не тикают.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;
