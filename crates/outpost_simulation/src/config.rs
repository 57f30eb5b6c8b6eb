//! Конфигурация: simulation settings + agent blueprints (serde/JSON)
//!
//! Blueprint описывает агента целиком (профиль, оружие, стартовое состояние),
//! `spawn::spawn_agent` собирает из него entity. Валидация — на spawn,
//! ошибки возвращаются вызывающему (`ConfigError`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{AgentProfile, BehaviorKind, MeleeData};
use crate::combat::{Barrel, CollisionFilter, ShotMode, Weapon, WeaponSounds, ALL_LAYERS};
use crate::headless::Senses;

/// Ошибки конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("clip capacity must be positive")]
    ZeroClipCapacity,

    #[error("ammo in clip ({ammo}) exceeds clip capacity ({capacity})")]
    AmmoExceedsCapacity { ammo: u32, capacity: u32 },

    #[error("weapon has no barrels")]
    NoBarrels,

    #[error("barrel {index}: cadence must be positive (got {cadence})")]
    NonPositiveCadence { index: usize, cadence: f32 },

    #[error("{field} must not be negative (got {value})")]
    NegativeValue { field: &'static str, value: f32 },

    #[error("tick rate must be positive (got {0})")]
    InvalidTickRate(f64),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value < 0.0 {
        return Err(ConfigError::NegativeValue { field, value });
    }
    Ok(())
}

/// Глобальные настройки симуляции
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Частота SimulationTick (Hz)
    pub tick_hz: f64,
    /// Seed для DeterministicRng
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0, // 60Hz — легче считать интервалы
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_hz > 0.0) {
            return Err(ConfigError::InvalidTickRate(self.tick_hz));
        }
        Ok(())
    }
}

/// Один ствол
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrelConfig {
    /// Выстрелов в секунду
    pub cadence: f32,
    /// [horizontal, vertical] градусы
    pub dispersion: [f32; 2],
    pub range: f32,
    pub damage: u32,
    /// Локальная позиция дула [x, y, z]
    pub muzzle_offset: [f32; 3],
    pub collision_layers: u32,
}

impl Default for BarrelConfig {
    fn default() -> Self {
        let barrel = Barrel::default();
        Self {
            cadence: barrel.cadence,
            dispersion: barrel.dispersion.to_array(),
            range: barrel.range,
            damage: barrel.damage,
            muzzle_offset: barrel.muzzle_offset.to_array(),
            collision_layers: ALL_LAYERS,
        }
    }
}

impl BarrelConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !(self.cadence > 0.0) {
            return Err(ConfigError::NonPositiveCadence {
                index,
                cadence: self.cadence,
            });
        }
        non_negative("barrel range", self.range)?;
        non_negative("horizontal dispersion", self.dispersion[0])?;
        non_negative("vertical dispersion", self.dispersion[1])?;
        Ok(())
    }

    pub fn build(&self) -> Barrel {
        Barrel {
            cadence: self.cadence,
            dispersion: Vec2::from_array(self.dispersion),
            range: self.range,
            damage: self.damage,
            muzzle_offset: Vec3::from_array(self.muzzle_offset),
            filter: CollisionFilter::with_layers(self.collision_layers),
            ..default()
        }
    }
}

/// Оружие агента
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub shot_mode: ShotMode,
    pub clip_capacity: u32,
    pub ammo_in_clip: u32,
    pub spare_clips: u32,
    /// Секунды
    pub reload_duration: f64,
    pub force_fire: bool,
    pub sounds: WeaponSounds,
    pub casing_effect: Option<String>,
    pub barrels: Vec<BarrelConfig>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            shot_mode: ShotMode::ShotByShot,
            clip_capacity: 30,
            ammo_in_clip: 30,
            spare_clips: 3,
            reload_duration: 2.0,
            force_fire: false,
            sounds: WeaponSounds::default(),
            casing_effect: None,
            barrels: vec![BarrelConfig::default()],
        }
    }
}

impl WeaponConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clip_capacity == 0 {
            return Err(ConfigError::ZeroClipCapacity);
        }
        if self.ammo_in_clip > self.clip_capacity {
            return Err(ConfigError::AmmoExceedsCapacity {
                ammo: self.ammo_in_clip,
                capacity: self.clip_capacity,
            });
        }
        if self.reload_duration < 0.0 {
            return Err(ConfigError::NegativeValue {
                field: "reload duration",
                value: self.reload_duration as f32,
            });
        }
        if self.barrels.is_empty() {
            return Err(ConfigError::NoBarrels);
        }
        for (index, barrel) in self.barrels.iter().enumerate() {
            barrel.validate(index)?;
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Weapon, ConfigError> {
        self.validate()?;

        let mut weapon = Weapon::new(
            self.shot_mode,
            self.clip_capacity,
            self.ammo_in_clip,
            self.spare_clips,
        )
        .with_reload_duration(self.reload_duration);
        weapon.force_fire = self.force_fire;
        weapon.sounds = self.sounds.clone();
        weapon.casing_effect = self.casing_effect.clone();
        weapon.barrels = self.barrels.iter().map(BarrelConfig::build).collect();

        Ok(weapon)
    }
}

/// Melee параметры
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    pub reach: f32,
    pub interval: f64,
    pub damage: u32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        let melee = MeleeData::default();
        Self {
            reach: melee.reach,
            interval: melee.interval,
            damage: melee.damage,
        }
    }
}

impl MeleeConfig {
    pub fn build(&self) -> MeleeData {
        MeleeData {
            reach: self.reach,
            interval: self.interval,
            damage: self.damage,
            ..default()
        }
    }
}

/// Полное описание агента для spawn'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentBlueprint {
    pub name: String,
    pub faction_id: u64,
    pub position: [f32; 3],
    /// Поворот вокруг Y (градусы), 0 = смотрит в −Z
    pub yaw_degrees: f32,
    pub max_health: u32,
    /// Радиус headless hit-сферы
    pub hit_radius: f32,
    pub movement_speed: f32,
    pub profile: AgentProfile,
    pub start_state: BehaviorKind,
    pub patrol_route: Vec<[f32; 3]>,
    pub melee: MeleeConfig,
    /// None = безоружный (только melee)
    pub weapon: Option<WeaponConfig>,
    /// Headless proximity senses (None = порты пишет host)
    pub senses: Option<Senses>,
}

impl Default for AgentBlueprint {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            faction_id: 0,
            position: [0.0; 3],
            yaw_degrees: 0.0,
            max_health: 100,
            hit_radius: 0.5,
            movement_speed: 2.0,
            profile: AgentProfile::default(),
            start_state: BehaviorKind::Idle,
            patrol_route: Vec::new(),
            melee: MeleeConfig::default(),
            weapon: None,
            senses: None,
        }
    }
}

impl AgentBlueprint {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("shoot range", self.profile.shoot_range)?;
        non_negative("valiant range", self.profile.valiant_range)?;
        non_negative("hit radius", self.hit_radius)?;
        non_negative("movement speed", self.movement_speed)?;
        non_negative("melee reach", self.melee.reach)?;
        if let Some(weapon) = &self.weapon {
            weapon.validate()?;
        }
        Ok(())
    }
}

/// Сценарий для headless runner'а: настройки + агенты
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: SimulationConfig,
    /// Сколько тиков прогнать
    pub ticks: u32,
    pub agents: Vec<AgentBlueprint>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.config.validate()?;
        for agent in &scenario.agents {
            agent.validate()?;
        }
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EngagementStyle;

    #[test]
    fn test_blueprint_from_json_with_defaults() {
        let json = r#"{
            "name": "sentry",
            "faction_id": 2,
            "position": [1.0, 0.0, -4.0],
            "profile": { "engagement_style": "Guardian", "shoot_range": 25.0 },
            "start_state": "Patrol",
            "weapon": { "shot_mode": "Continuous", "clip_capacity": 12, "ammo_in_clip": 12 }
        }"#;

        let blueprint = AgentBlueprint::from_json(json).unwrap();

        assert_eq!(blueprint.name, "sentry");
        assert_eq!(blueprint.profile.engagement_style, EngagementStyle::Guardian);
        assert_eq!(blueprint.profile.shoot_range, 25.0);
        assert_eq!(blueprint.profile.valiant_range, 5.0);
        assert_eq!(blueprint.start_state, BehaviorKind::Patrol);
        assert_eq!(blueprint.max_health, 100);

        let weapon = blueprint.weapon.unwrap().build().unwrap();
        assert_eq!(weapon.shot_mode, ShotMode::Continuous);
        assert_eq!(weapon.clip_capacity(), 12);
        assert_eq!(weapon.spare_clips(), 3);
        assert_eq!(weapon.barrels.len(), 1);
        assert_eq!(weapon.barrels[0].cadence, 10.0);
    }

    #[test]
    fn test_weapon_validation() {
        let zero = WeaponConfig {
            clip_capacity: 0,
            ammo_in_clip: 0,
            ..default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroClipCapacity)));

        let overfull = WeaponConfig {
            clip_capacity: 10,
            ammo_in_clip: 11,
            ..default()
        };
        assert!(matches!(
            overfull.validate(),
            Err(ConfigError::AmmoExceedsCapacity { ammo: 11, capacity: 10 })
        ));

        let stalled = WeaponConfig {
            barrels: vec![BarrelConfig {
                cadence: 0.0,
                ..default()
            }],
            ..default()
        };
        assert!(matches!(
            stalled.validate(),
            Err(ConfigError::NonPositiveCadence { index: 0, .. })
        ));

        let no_barrels = WeaponConfig {
            barrels: Vec::new(),
            ..default()
        };
        assert!(matches!(no_barrels.validate(), Err(ConfigError::NoBarrels)));
    }

    #[test]
    fn test_negative_range_rejected() {
        let mut blueprint = AgentBlueprint::default();
        blueprint.profile.shoot_range = -1.0;

        assert!(matches!(
            blueprint.validate(),
            Err(ConfigError::NegativeValue { field: "shoot range", .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            AgentBlueprint::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_scenario_rejects_bad_tick_rate() {
        let json = r#"{ "config": { "tick_hz": 0.0 }, "ticks": 10 }"#;
        assert!(matches!(
            Scenario::from_json(json),
            Err(ConfigError::InvalidTickRate(_))
        ));
    }
}
