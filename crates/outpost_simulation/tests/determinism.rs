//! Тесты детерминизма
//!
//! Проверяем что симуляция с одинаковым seed даёт идентичные результаты
//! (dispersion через DeterministicRng, порядок портов, таймеры).

use bevy::prelude::*;
use outpost_simulation::config::BarrelConfig;
use outpost_simulation::{
    create_headless_app, run_ticks, spawn_agent, world_snapshot, AgentBlueprint, AgentProfile,
    BehaviorKind, BehaviorMachine, EngagementStyle, HeadlessHostPlugin, Health, Senses, ShotMode,
    Weapon, WeaponConfig,
};

/// Запускает перестрелку и возвращает snapshot мира
fn run_skirmish(seed: u64, tick_count: u32) -> Vec<u8> {
    let mut app = create_headless_app(seed);
    app.add_plugins(HeadlessHostPlugin);

    let rifle = WeaponConfig {
        shot_mode: ShotMode::Continuous,
        clip_capacity: 12,
        ammo_in_clip: 12,
        spare_clips: 2,
        reload_duration: 1.0,
        barrels: vec![BarrelConfig {
            cadence: 5.0,
            dispersion: [6.0, 4.0],
            damage: 4,
            ..default()
        }],
        ..default()
    };

    for index in 0..4 {
        let x = index as f32 * 2.5;
        for (faction_id, z, style) in [
            (1, 0.0, EngagementStyle::Cautious),
            (2, -16.0, EngagementStyle::Guardian),
        ] {
            let blueprint = AgentBlueprint {
                faction_id,
                position: [x, 0.0, z],
                profile: AgentProfile::new(style),
                start_state: BehaviorKind::Patrol,
                patrol_route: vec![[x, 0.0, z - 3.0], [x + 1.0, 0.0, z]],
                weapon: Some(rifle.clone()),
                senses: Some(Senses {
                    sight_radius: 18.0,
                    hearing_radius: 6.0,
                }),
                ..default()
            };
            spawn_agent(app.world_mut(), &blueprint).unwrap();
        }
    }

    run_ticks(&mut app, tick_count);

    let world = app.world_mut();
    let mut snapshot = world_snapshot::<Transform>(world);
    snapshot.extend(world_snapshot::<Health>(world));
    snapshot.extend(world_snapshot::<Weapon>(world));
    snapshot.extend(world_snapshot::<BehaviorMachine>(world));
    snapshot
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICK_COUNT: u32 = 600;

    let snapshot1 = run_skirmish(SEED, TICK_COUNT);
    let snapshot2 = run_skirmish(SEED, TICK_COUNT);

    // Снепшоты должны быть идентичны
    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICK_COUNT: u32 = 300;

    // Запускаем 3 раза — все должны быть идентичны
    let snapshots: Vec<_> = (0..3).map(|_| run_skirmish(SEED, TICK_COUNT)).collect();

    // Все снепшоты должны совпадать с первым
    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}
