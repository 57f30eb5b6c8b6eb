//! Movement компоненты: команды перемещения
//!
//! Locomotion/pathfinding — ответственность host'а. ECS пишет только intent.

use bevy::prelude::*;

/// Команда движения для актора (выполняется host NavigationAgent'ом)
///
/// Архитектура:
/// - Behavior states пишут MovementCommand (high-level intent)
/// - Host читает и конвертирует в свой navigation target
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub enum MovementCommand {
    /// Ничего не делать (не трогать текущий navigation target)
    #[default]
    Idle,
    /// Двигаться к позиции (world coordinates)
    MoveToPosition { target: Vec3 },
    /// Следовать за entity (target обновляется каждый frame)
    FollowEntity { target: Entity },
    /// Остановиться немедленно
    Stop,
}

/// Скорость движения актора (метры/сек), используется headless locomotion
#[derive(Component, Clone, Copy, Debug)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 2.0 } // 2 m/s — базовая скорость ходьбы
    }
}

/// Дистанция в плоскости XZ (locomotion не меняет высоту)
pub fn horizontal_distance(from: Vec3, to: Vec3) -> f32 {
    Vec2::new(to.x - from.x, to.z - from.z).length()
}
