//! Agent profile (engagement style, дальности) + target memory

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Как агент ведёт бой (per-agent policy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EngagementStyle {
    /// Без дальнего боя — только melee
    #[default]
    NonRanged,
    /// Стреляет и сближается до valiant_range
    Valiant,
    /// Осторожный стрелок; после первого контакта становится Valiant
    Cautious,
    /// Засада: не слушает, без цели стоит на месте
    Ambusher,
    /// Охрана: не запоминает цели, стреляет даже на звук
    Guardian,
}

impl EngagementStyle {
    /// Стиль, который arbiter повышает до Valiant при контакте
    pub fn is_valiant_eligible(self) -> bool {
        matches!(self, EngagementStyle::Cautious | EngagementStyle::Valiant)
    }

    pub fn uses_hearing(self) -> bool {
        self != EngagementStyle::Ambusher
    }

    pub fn remembers_targets(self) -> bool {
        self != EngagementStyle::Guardian
    }

    pub fn is_ranged(self) -> bool {
        self != EngagementStyle::NonRanged
    }
}

/// Профиль агента (фиксируется на spawn, меняется только engagement_style)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub engagement_style: EngagementStyle,
    /// Дистанция (м), с которой агент открывает огонь по видимой цели
    pub shoot_range: f32,
    /// Valiant сближается до этой дистанции
    pub valiant_range: f32,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            engagement_style: EngagementStyle::NonRanged,
            shoot_range: 15.0,
            valiant_range: 5.0,
        }
    }
}

impl AgentProfile {
    pub fn new(engagement_style: EngagementStyle) -> Self {
        Self {
            engagement_style,
            ..default()
        }
    }
}

/// Последняя известная позиция потерянной цели
///
/// Позиция имеет смысл только пока `is_valid()`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetMemory {
    last_known_position: Vec3,
    valid: bool,
}

impl TargetMemory {
    /// Записать позицию цели; `valid == false` для стилей без памяти
    pub fn remember(&mut self, position: Vec3, valid: bool) {
        self.last_known_position = position;
        self.valid = valid;
    }

    pub fn forget(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn position(&self) -> Option<Vec3> {
        self.valid.then_some(self.last_known_position)
    }

    /// Сырое значение (без учёта валидности)
    pub fn last_known_position(&self) -> Vec3 {
        self.last_known_position
    }
}
