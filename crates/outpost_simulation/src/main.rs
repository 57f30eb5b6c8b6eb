//! Headless симуляция OUTPOST
//!
//! Прогоняет сценарий (JSON из первого аргумента, либо встроенная стычка)
//! без рендера и печатает итоговое состояние агентов.

use bevy::prelude::*;
use outpost_simulation::ai::PatrolRoute;
use outpost_simulation::config::{BarrelConfig, MeleeConfig};
use outpost_simulation::{
    init_logger, log_error, log_info, run_ticks, spawn_agent, spawn_obstacle, AgentBlueprint,
    AgentProfile, BehaviorKind, BehaviorMachine, EngagementStyle, HeadlessHostPlugin, Health,
    Scenario, Senses, ShotMode, SimulationConfig, SimulationPlugin, TargetMemory, Weapon,
    WeaponConfig,
};

fn builtin_scenario() -> Scenario {
    let rifle = WeaponConfig {
        shot_mode: ShotMode::Continuous,
        clip_capacity: 20,
        ammo_in_clip: 20,
        spare_clips: 2,
        reload_duration: 1.5,
        barrels: vec![BarrelConfig {
            cadence: 4.0,
            dispersion: [2.0, 2.0],
            damage: 6,
            ..default()
        }],
        ..default()
    };
    let pistol = WeaponConfig {
        shot_mode: ShotMode::ShotByShot,
        clip_capacity: 8,
        ammo_in_clip: 8,
        spare_clips: 4,
        barrels: vec![BarrelConfig {
            cadence: 2.0,
            damage: 12,
            ..default()
        }],
        ..default()
    };

    Scenario {
        config: SimulationConfig::default(),
        ticks: 1200,
        agents: vec![
            AgentBlueprint {
                name: "raider".to_string(),
                faction_id: 1,
                position: [0.0, 0.0, 0.0],
                profile: AgentProfile::new(EngagementStyle::Cautious),
                start_state: BehaviorKind::Patrol,
                patrol_route: vec![[0.0, 0.0, -10.0], [6.0, 0.0, -10.0]],
                weapon: Some(rifle),
                senses: Some(Senses::default()),
                ..default()
            },
            AgentBlueprint {
                name: "brute".to_string(),
                faction_id: 1,
                position: [-3.0, 0.0, 0.0],
                movement_speed: 3.0,
                melee: MeleeConfig {
                    damage: 15,
                    ..default()
                },
                start_state: BehaviorKind::Patrol,
                patrol_route: vec![[-3.0, 0.0, -12.0]],
                senses: Some(Senses::default()),
                ..default()
            },
            AgentBlueprint {
                name: "sentry".to_string(),
                faction_id: 2,
                position: [3.0, 0.0, -25.0],
                yaw_degrees: 180.0,
                profile: AgentProfile::new(EngagementStyle::Guardian),
                start_state: BehaviorKind::Idle,
                weapon: Some(pistol),
                senses: Some(Senses {
                    sight_radius: 18.0,
                    hearing_radius: 10.0,
                }),
                ..default()
            },
        ],
    }
}

fn load_scenario() -> Result<Scenario, String> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(builtin_scenario());
    };
    let json = std::fs::read_to_string(&path).map_err(|err| format!("{}: {}", path, err))?;
    Scenario::from_json(&json).map_err(|err| format!("{}: {}", path, err))
}

fn main() {
    init_logger();

    let scenario = match load_scenario() {
        Ok(scenario) => scenario,
        Err(err) => {
            log_error(&format!("Failed to load scenario: {}", err));
            std::process::exit(1);
        }
    };

    println!(
        "Starting OUTPOST headless simulation (seed: {}, {} agents, {} ticks)",
        scenario.config.seed,
        scenario.agents.len(),
        scenario.ticks
    );

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin {
            config: scenario.config.clone(),
        })
        .add_plugins(HeadlessHostPlugin);

    let mut agents = Vec::new();
    for blueprint in &scenario.agents {
        match spawn_agent(app.world_mut(), blueprint) {
            Ok(entity) => agents.push((blueprint.name.clone(), entity)),
            Err(err) => log_error(&format!("Skipping '{}': {}", blueprint.name, err)),
        }
    }
    spawn_obstacle(app.world_mut(), Vec3::new(1.0, 1.0, -17.0), 0.8);

    for tick in (0..scenario.ticks).step_by(100) {
        let batch = (scenario.ticks - tick).min(100);
        run_ticks(&mut app, batch);
        log_info(&format!("Tick {}", tick + batch));
    }

    println!("Simulation complete!");
    let world = app.world();
    for (name, entity) in agents {
        let health = world.get::<Health>(entity).map(|health| health.current);
        let state = world.get::<BehaviorMachine>(entity).map(BehaviorMachine::active);
        let memory = world.get::<TargetMemory>(entity).and_then(TargetMemory::position);
        let ammo = world.get::<Weapon>(entity).map(Weapon::ammo_info);
        let patrol = world
            .get::<BehaviorMachine>(entity)
            .map(|machine| &machine.patrol)
            .map(PatrolRoute::cursor);
        println!(
            "{:>8} {:?}: hp {:?}, state {:?}, memory {:?}, ammo {:?}, patrol cursor {:?}",
            name, entity, health, state, memory, ammo, patrol
        );
    }
}
