//! OUTPOST Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: AI decision arbiter (sight + hearing)
//! и hit-scan оружие (ammo, reload, баррели, dispersion).
//!
//! HEADLESS ARCHITECTURE:
//! - ECS = game state, AI решения, правила боя
//! - Host = физика (WorldQuery), рендер/звук/анимации (PresentationCue),
//!   locomotion (MovementCommand), восприятие (SightPort/HearingPort)
//!
//! Весь тик — один schedule `SimulationTick`, запускаемый из FixedUpdate.

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod clock;
pub mod combat;
pub mod components;
pub mod config;
pub mod headless;
pub mod logger;
pub mod perception;
pub mod presentation;
pub mod scheduler;
pub mod spawn;

// Re-export базовых типов для удобства
pub use ai::{
    AIPlugin, AgentProfile, BehaviorChanged, BehaviorKind, BehaviorMachine, EngagementStyle,
    LastPositionReached, TargetMemory,
};
pub use clock::SimClock;
pub use combat::{
    CombatPlugin, DamageDealt, EntityDied, HitLanded, HitScanWorld, ShotMode, Weapon,
    WeaponCommand, WeaponCommandKind, WeaponDiagnostic, WorldQuery,
};
pub use components::*;
pub use config::{AgentBlueprint, ConfigError, Scenario, SimulationConfig, WeaponConfig};
pub use headless::{HeadlessHostPlugin, Senses};
pub use logger::{init_logger, log, log_error, log_info, log_warning, LogLevel, LogPrinter};
pub use perception::{HearingPort, PerceptionEvent, SightPort};
pub use presentation::PresentationCue;
pub use scheduler::{TimerAction, TimerScheduler};
pub use spawn::{spawn_agent, spawn_obstacle};

/// Schedule одного тика симуляции
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimulationTick;

/// Фазы тика (выполняются строго последовательно)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// advance_sim_clock
    Clock,
    /// dispatch_due_timers (reload finish, muzzle flash off)
    Timers,
    /// Порты восприятия
    Perception,
    /// Arbiter + логика состояний
    Decision,
    /// Оружие + урон
    Combat,
    /// Headless host (locomotion)
    Host,
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: SimulationConfig,
}

impl SimulationPlugin {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            config: SimulationConfig { seed, ..default() },
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone();

        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            // Детерминистичный RNG (dispersion)
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(SimClock::from_hz(config.tick_hz))
            .init_resource::<TimerScheduler>()
            .insert_resource(config)
            .add_event::<PresentationCue>()
            .add_event::<PerceptionEvent>()
            .init_schedule(SimulationTick)
            .configure_sets(
                SimulationTick,
                (
                    SimulationSet::Clock,
                    SimulationSet::Timers,
                    SimulationSet::Perception,
                    SimulationSet::Decision,
                    SimulationSet::Combat,
                    SimulationSet::Host,
                )
                    .chain(),
            )
            .add_systems(
                SimulationTick,
                (
                    clock::advance_sim_clock.in_set(SimulationSet::Clock),
                    scheduler::dispatch_due_timers.in_set(SimulationSet::Timers),
                    (
                        perception::apply_perception_events,
                        perception::refresh_perceived_positions,
                    )
                        .chain()
                        .in_set(SimulationSet::Perception),
                ),
            )
            .add_systems(FixedUpdate, run_simulation_tick)
            // Подсистемы
            .add_plugins((CombatPlugin, AIPlugin));
    }
}

/// Exclusive system: один прогон SimulationTick на каждый FixedUpdate
pub fn run_simulation_tick(world: &mut World) {
    world.run_schedule(SimulationTick);
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без host plugin'а)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin::with_seed(seed));

    app
}

/// Прогнать `ticks` тиков напрямую (без real-time FixedUpdate)
pub fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(SimulationTick);
    }
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
