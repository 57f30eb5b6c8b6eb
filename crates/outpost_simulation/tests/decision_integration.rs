//! Integration тесты decision arbiter'а: полный SimulationTick на headless App

use bevy::prelude::*;
use outpost_simulation::{
    create_headless_app, run_ticks, spawn_agent, AgentBlueprint, AgentProfile, BehaviorChanged,
    BehaviorKind, BehaviorMachine, EngagementStyle, HeadlessHostPlugin, Health,
    LastPositionReached, MovementCommand, PerceptionEvent, Senses, SimClock, TargetMemory,
    WeaponConfig,
};

const PLAYERS: u64 = 1;
const RAIDERS: u64 = 2;

fn setup_app() -> App {
    let mut app = create_headless_app(42);
    // Шаг 0.25s — точные float'ы во времени
    app.insert_resource(SimClock::with_step(0.25));
    app
}

fn armed(style: EngagementStyle, start_state: BehaviorKind) -> AgentBlueprint {
    AgentBlueprint {
        faction_id: RAIDERS,
        profile: AgentProfile::new(style),
        start_state,
        weapon: Some(WeaponConfig::default()),
        ..default()
    }
}

fn target_at(app: &mut App, position: [f32; 3]) -> Entity {
    let blueprint = AgentBlueprint {
        name: "target".to_string(),
        faction_id: PLAYERS,
        position,
        profile: AgentProfile::new(EngagementStyle::Ambusher),
        ..default()
    };
    spawn_agent(app.world_mut(), &blueprint).unwrap()
}

fn active_state(app: &App, agent: Entity) -> BehaviorKind {
    app.world().get::<BehaviorMachine>(agent).unwrap().active()
}

fn memory(app: &App, agent: Entity) -> TargetMemory {
    *app.world().get::<TargetMemory>(agent).unwrap()
}

fn events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

#[test]
fn test_guardian_in_range_shoots_and_keeps_no_memory() {
    let mut app = setup_app();
    let guardian = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Guardian, BehaviorKind::Idle),
    )
    .unwrap();
    let intruder = target_at(&mut app, [5.0, 0.0, 0.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: guardian,
        target: intruder,
    });
    run_ticks(&mut app, 1);

    assert_eq!(active_state(&app, guardian), BehaviorKind::Shoot);
    assert!(!memory(&app, guardian).is_valid());
    assert_eq!(
        app.world().get::<AgentProfile>(guardian).unwrap().engagement_style,
        EngagementStyle::Guardian
    );
}

#[test]
fn test_reselecting_same_state_is_idempotent() {
    let mut app = setup_app();
    let guardian = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Guardian, BehaviorKind::Idle),
    )
    .unwrap();
    let intruder = target_at(&mut app, [5.0, 0.0, 0.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: guardian,
        target: intruder,
    });
    run_ticks(&mut app, 10);

    let changes: Vec<BehaviorChanged> = events(&app);
    let guardian_changes: Vec<_> = changes.iter().filter(|change| change.agent == guardian).collect();
    assert_eq!(guardian_changes.len(), 1);
    assert_eq!(guardian_changes[0].from, BehaviorKind::Idle);
    assert_eq!(guardian_changes[0].to, BehaviorKind::Shoot);
    assert_eq!(app.world().get::<BehaviorMachine>(guardian).unwrap().transitions(), 1);
}

#[test]
fn test_cautious_target_out_of_range_keeps_state() {
    let mut app = setup_app();
    let scout = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Cautious, BehaviorKind::Patrol),
    )
    .unwrap();
    let far = target_at(&mut app, [0.0, 0.0, -20.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: scout,
        target: far,
    });
    run_ticks(&mut app, 1);

    let machine = app.world().get::<BehaviorMachine>(scout).unwrap();
    assert_eq!(machine.active(), BehaviorKind::Patrol);
    assert_eq!(machine.transitions(), 0);

    // Стиль повышен и память записана, хотя перехода нет
    assert_eq!(
        app.world().get::<AgentProfile>(scout).unwrap().engagement_style,
        EngagementStyle::Valiant
    );
    assert_eq!(memory(&app, scout).position(), Some(Vec3::new(0.0, 0.0, -20.0)));
}

#[test]
fn test_lost_target_investigated_then_forgotten() {
    let mut app = setup_app();
    let hunter = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Cautious, BehaviorKind::Patrol),
    )
    .unwrap();
    let prey = target_at(&mut app, [0.0, 0.0, -8.0]);

    // Tick 1: цель видна → Valiant
    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: hunter,
        target: prey,
    });
    run_ticks(&mut app, 1);
    assert_eq!(active_state(&app, hunter), BehaviorKind::Valiant);
    assert_eq!(
        app.world().get::<MovementCommand>(hunter),
        Some(&MovementCommand::FollowEntity { target: prey })
    );

    // Tick 2: цель потеряна → investigate запомненной позиции
    app.world_mut().send_event(PerceptionEvent::Unseen {
        observer: hunter,
        target: prey,
    });
    run_ticks(&mut app, 1);

    let machine = app.world().get::<BehaviorMachine>(hunter).unwrap();
    assert_eq!(machine.active(), BehaviorKind::InvestigateLastPosition);
    assert_eq!(machine.investigate.destination(), Vec3::new(0.0, 0.0, -8.0));
    assert!(memory(&app, hunter).is_valid());
    assert_eq!(
        app.world().get::<MovementCommand>(hunter),
        Some(&MovementCommand::MoveToPosition {
            target: Vec3::new(0.0, 0.0, -8.0)
        })
    );

    // Tick 3: дошли → arrival signal → память невалидна
    app.world_mut()
        .get_mut::<Transform>(hunter)
        .unwrap()
        .translation = Vec3::new(0.0, 0.0, -7.8);
    run_ticks(&mut app, 1);

    assert!(!memory(&app, hunter).is_valid());
    let arrivals: Vec<LastPositionReached> = events(&app);
    assert_eq!(arrivals, vec![LastPositionReached { agent: hunter }]);

    // Tick 4: ни цели, ни памяти → Patrol
    run_ticks(&mut app, 1);
    assert_eq!(active_state(&app, hunter), BehaviorKind::Patrol);
}

#[test]
fn test_elevated_last_position_is_reached_on_foot() {
    let mut app = setup_app();
    app.add_plugins(HeadlessHostPlugin);

    let hunter = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Cautious, BehaviorKind::Patrol),
    )
    .unwrap();
    // Цель на уступе: locomotion двигает только по XZ
    let prey = target_at(&mut app, [0.0, 1.0, -6.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: hunter,
        target: prey,
    });
    run_ticks(&mut app, 1);
    app.world_mut().send_event(PerceptionEvent::Unseen {
        observer: hunter,
        target: prey,
    });
    run_ticks(&mut app, 1);
    assert_eq!(active_state(&app, hunter), BehaviorKind::InvestigateLastPosition);

    run_ticks(&mut app, 200);

    assert!(!memory(&app, hunter).is_valid());
    assert_eq!(active_state(&app, hunter), BehaviorKind::Patrol);
    let position = app.world().get::<Transform>(hunter).unwrap().translation;
    assert_eq!(position.y, 0.0);
    assert!(Vec2::new(position.x, position.z + 6.0).length() <= 0.5);
}

#[test]
fn test_patrol_advances_past_elevated_waypoints() {
    let mut app = setup_app();
    app.add_plugins(HeadlessHostPlugin);

    let walker = spawn_agent(
        app.world_mut(),
        &AgentBlueprint {
            faction_id: RAIDERS,
            start_state: BehaviorKind::Patrol,
            patrol_route: vec![[0.0, 2.0, -2.0], [0.0, 2.0, 2.0]],
            ..default()
        },
    )
    .unwrap();

    let mut advanced = false;
    for _ in 0..20 {
        run_ticks(&mut app, 1);
        let machine = app.world().get::<BehaviorMachine>(walker).unwrap();
        if machine.patrol.cursor() == 1 {
            advanced = true;
            break;
        }
    }

    assert!(advanced, "first waypoint should count as reached");
}

#[test]
fn test_nearer_heard_target_is_sought() {
    let mut app = setup_app();
    let scout = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Valiant, BehaviorKind::Patrol),
    )
    .unwrap();
    let seen = target_at(&mut app, [0.0, 0.0, -12.0]);
    let heard = target_at(&mut app, [3.0, 0.0, 0.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: scout,
        target: seen,
    });
    app.world_mut().send_event(PerceptionEvent::Heard {
        observer: scout,
        target: heard,
    });
    run_ticks(&mut app, 1);

    let machine = app.world().get::<BehaviorMachine>(scout).unwrap();
    assert_eq!(machine.active(), BehaviorKind::Seek);
    assert_eq!(machine.target.map(|target| target.entity), Some(heard));
    assert_eq!(
        app.world().get::<MovementCommand>(scout),
        Some(&MovementCommand::FollowEntity { target: heard })
    );
}

#[test]
fn test_ambusher_waits_idle_when_only_heard() {
    let mut app = setup_app();
    let ambusher = spawn_agent(
        app.world_mut(),
        &armed(EngagementStyle::Ambusher, BehaviorKind::Patrol),
    )
    .unwrap();
    let noisy = target_at(&mut app, [2.0, 0.0, 0.0]);

    app.world_mut().send_event(PerceptionEvent::Heard {
        observer: ambusher,
        target: noisy,
    });
    run_ticks(&mut app, 3);

    assert_eq!(active_state(&app, ambusher), BehaviorKind::Idle);
    assert!(!memory(&app, ambusher).is_valid());
}

#[test]
fn test_unarmed_agent_strikes_in_melee() {
    let mut app = setup_app();
    let brute = spawn_agent(
        app.world_mut(),
        &AgentBlueprint {
            faction_id: RAIDERS,
            start_state: BehaviorKind::Patrol,
            ..default()
        },
    )
    .unwrap();
    let victim = target_at(&mut app, [1.0, 0.0, 0.0]);

    app.world_mut().send_event(PerceptionEvent::Seen {
        observer: brute,
        target: victim,
    });

    // Tick 1 (t=0.25): удар, следующий не раньше t=1.25
    run_ticks(&mut app, 1);
    assert_eq!(active_state(&app, brute), BehaviorKind::MeleeAttack);
    assert_eq!(app.world().get::<Health>(victim).unwrap().current, 90);

    run_ticks(&mut app, 3);
    assert_eq!(app.world().get::<Health>(victim).unwrap().current, 90);

    // Tick 5 (t=1.25): второй удар
    run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(victim).unwrap().current, 80);
}

#[test]
fn test_exactly_one_state_active_during_skirmish() {
    let mut app = setup_app();
    app.add_plugins(HeadlessHostPlugin);

    let mut agents = Vec::new();
    for (index, style) in [
        EngagementStyle::Cautious,
        EngagementStyle::Guardian,
        EngagementStyle::Ambusher,
        EngagementStyle::NonRanged,
    ]
    .into_iter()
    .enumerate()
    {
        let x = index as f32 * 3.0;
        for (faction_id, z) in [(PLAYERS, 0.0), (RAIDERS, -14.0)] {
            let blueprint = AgentBlueprint {
                faction_id,
                position: [x, 0.0, z],
                profile: AgentProfile::new(style),
                start_state: BehaviorKind::Patrol,
                patrol_route: vec![[x, 0.0, z - 4.0], [x + 2.0, 0.0, z]],
                weapon: (style != EngagementStyle::NonRanged).then(WeaponConfig::default),
                senses: Some(Senses::default()),
                ..default()
            };
            agents.push(spawn_agent(app.world_mut(), &blueprint).unwrap());
        }
    }

    for _ in 0..200 {
        run_ticks(&mut app, 1);
        for agent in &agents {
            let machine = app.world().get::<BehaviorMachine>(*agent).unwrap();
            assert_eq!(machine.active_count(), 1);
            assert!(machine.is_active(machine.active()));
        }
    }

    // Кто-то кого-то точно заметил
    let changes: Vec<BehaviorChanged> = events(&app);
    assert!(!changes.is_empty());
}
