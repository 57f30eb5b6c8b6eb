//! Presentation cues (ECS → host)
//!
//! Fire-and-forget уведомления для rendering/audio/animation слоя.
//! Core никогда не ждёт ответа и не получает ошибок: если host не умеет
//! показать эффект — он его просто игнорирует.

use bevy::prelude::*;

/// Визуальный эффект в точке
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Попадание по damageable цели
    DamagingImpact,
    /// Попадание в стену/пропс
    InertImpact,
    /// Гильза (asset key из WeaponConfig)
    ShellCasing { asset: String },
}

/// Триггеры анимации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTrigger {
    Shoot,
    Reload,
    MeleeStrike,
}

/// Event: уведомление presentation слою
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PresentationCue {
    /// Spawn эффекта (impact decal, гильза)
    SpawnEffect {
        effect: EffectKind,
        position: Vec3,
        /// Нормаль поверхности (для ориентации decal'а)
        normal: Vec3,
    },

    /// Tracer от дула до конечной точки выстрела
    Tracer { from: Vec3, to: Vec3 },

    /// Muzzle flash вкл/выкл (выключение — через TimerScheduler)
    MuzzleFlash {
        agent: Entity,
        barrel: usize,
        lit: bool,
    },

    /// Проиграть звук (asset key)
    PlaySound { agent: Entity, sound: String },

    /// Дёрнуть trigger анимации
    TriggerAnimation {
        agent: Entity,
        trigger: AnimationTrigger,
    },
}
