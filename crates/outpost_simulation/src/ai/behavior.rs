//! Behavior state machine: 7 взаимоисключающих состояний
//!
//! Архитектура:
//! - `BehaviorMachine` создаётся один раз на spawn и живёт весь lifetime агента
//! - Состояния не пересоздаются: переход = exit hook старого, enabled флаги,
//!   enter hook нового
//! - Hook'и не трогают ECS напрямую: пишут `HookOutput` (movement intent,
//!   trigger), вызывающая система применяет его к MovementCommand/Weapon
//! - Per-state данные (курсор патруля, точка investigate, melee cooldown)
//!   хранятся здесь же

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::arbiter::FusedTarget;
use crate::combat::Weapon;
use crate::components::MovementCommand;

/// Состояния поведения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorKind {
    #[default]
    Idle,
    Patrol,
    Seek,
    MeleeAttack,
    Shoot,
    Valiant,
    InvestigateLastPosition,
}

impl BehaviorKind {
    pub const COUNT: usize = 7;

    pub const ALL: [BehaviorKind; Self::COUNT] = [
        BehaviorKind::Idle,
        BehaviorKind::Patrol,
        BehaviorKind::Seek,
        BehaviorKind::MeleeAttack,
        BehaviorKind::Shoot,
        BehaviorKind::Valiant,
        BehaviorKind::InvestigateLastPosition,
    ];

    pub const fn index(self) -> usize {
        match self {
            BehaviorKind::Idle => 0,
            BehaviorKind::Patrol => 1,
            BehaviorKind::Seek => 2,
            BehaviorKind::MeleeAttack => 3,
            BehaviorKind::Shoot => 4,
            BehaviorKind::Valiant => 5,
            BehaviorKind::InvestigateLastPosition => 6,
        }
    }

    /// Состояние держит trigger оружия
    pub fn is_firing(self) -> bool {
        matches!(self, BehaviorKind::Shoot | BehaviorKind::Valiant)
    }
}

/// Что hook просит сделать с оружием
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerIntent {
    Hold,
    Release,
}

/// Side effects перехода (последняя запись побеждает: enter перекрывает exit)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutput {
    pub movement: Option<MovementCommand>,
    pub trigger: Option<TriggerIntent>,
}

/// Применить side effects перехода к компонентам агента
pub fn apply_hook_output(
    output: &HookOutput,
    movement: &mut MovementCommand,
    weapon: Option<&mut Weapon>,
) {
    if let Some(command) = &output.movement {
        *movement = command.clone();
    }

    let (Some(trigger), Some(weapon)) = (output.trigger, weapon) else {
        return;
    };
    match trigger {
        TriggerIntent::Hold => weapon.start_shooting(),
        TriggerIntent::Release => weapon.stop_shooting(),
    }
}

pub type Hook = fn(&mut BehaviorMachine, &mut HookOutput);

/// Enter/Exit hooks одного состояния
pub struct BehaviorHooks {
    pub kind: BehaviorKind,
    pub enter: Hook,
    pub exit: Hook,
}

/// Таблица hooks (индекс = `BehaviorKind::index`)
pub const HOOKS: [BehaviorHooks; BehaviorKind::COUNT] = [
    BehaviorHooks {
        kind: BehaviorKind::Idle,
        enter: stop_moving,
        exit: no_op,
    },
    BehaviorHooks {
        kind: BehaviorKind::Patrol,
        enter: enter_patrol,
        exit: no_op,
    },
    BehaviorHooks {
        kind: BehaviorKind::Seek,
        enter: no_op,
        exit: stop_moving,
    },
    BehaviorHooks {
        kind: BehaviorKind::MeleeAttack,
        enter: no_op,
        exit: stop_moving,
    },
    BehaviorHooks {
        kind: BehaviorKind::Shoot,
        enter: enter_shoot,
        exit: release_trigger,
    },
    BehaviorHooks {
        kind: BehaviorKind::Valiant,
        enter: hold_trigger,
        exit: exit_valiant,
    },
    BehaviorHooks {
        kind: BehaviorKind::InvestigateLastPosition,
        enter: enter_investigate,
        exit: stop_moving,
    },
];

fn no_op(_: &mut BehaviorMachine, _: &mut HookOutput) {}

fn stop_moving(_: &mut BehaviorMachine, out: &mut HookOutput) {
    out.movement = Some(MovementCommand::Stop);
}

fn hold_trigger(_: &mut BehaviorMachine, out: &mut HookOutput) {
    out.trigger = Some(TriggerIntent::Hold);
}

fn release_trigger(_: &mut BehaviorMachine, out: &mut HookOutput) {
    out.trigger = Some(TriggerIntent::Release);
}

fn enter_patrol(machine: &mut BehaviorMachine, out: &mut HookOutput) {
    out.movement = Some(match machine.patrol.current() {
        Some(target) => MovementCommand::MoveToPosition { target },
        None => MovementCommand::Stop,
    });
}

fn enter_shoot(machine: &mut BehaviorMachine, out: &mut HookOutput) {
    stop_moving(machine, out);
    hold_trigger(machine, out);
}

fn exit_valiant(machine: &mut BehaviorMachine, out: &mut HookOutput) {
    stop_moving(machine, out);
    release_trigger(machine, out);
}

fn enter_investigate(machine: &mut BehaviorMachine, out: &mut HookOutput) {
    machine.investigate.reached = false;
    out.movement = Some(MovementCommand::MoveToPosition {
        target: machine.investigate.destination,
    });
}

/// Маршрут патруля (зацикленный)
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    cursor: usize,
    pub arrival_radius: f32,
}

impl Default for PatrolRoute {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            cursor: 0,
            arrival_radius: 0.5,
        }
    }

    pub fn current(&self) -> Option<Vec3> {
        self.waypoints.get(self.cursor).copied()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Следующая точка (после последней — снова первая)
    pub fn advance(&mut self) -> Option<Vec3> {
        if self.waypoints.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.waypoints.len();
        self.current()
    }
}

/// InvestigateLastPosition: куда идём и дошли ли
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestigateData {
    destination: Vec3,
    pub arrival_radius: f32,
    reached: bool,
}

impl Default for InvestigateData {
    fn default() -> Self {
        Self {
            destination: Vec3::ZERO,
            arrival_radius: 0.5,
            reached: false,
        }
    }
}

impl InvestigateData {
    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    pub fn is_reached(&self) -> bool {
        self.reached
    }

    /// Новая точка сбрасывает `reached`
    pub fn set_destination(&mut self, destination: Vec3) {
        if self.destination != destination {
            self.destination = destination;
            self.reached = false;
        }
    }

    pub(crate) fn mark_reached(&mut self) {
        self.reached = true;
    }
}

/// MeleeAttack: параметры удара + cooldown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeData {
    /// Дистанция удара (м)
    pub reach: f32,
    /// Интервал между ударами (секунды)
    pub interval: f64,
    pub damage: u32,
    pub(crate) next_strike_at: f64,
}

impl Default for MeleeData {
    fn default() -> Self {
        Self {
            reach: 1.5,
            interval: 1.0,
            damage: 10,
            next_strike_at: 0.0,
        }
    }
}

/// Behavior state machine агента
///
/// Инвариант: ровно одно состояние enabled, и это `active`.
#[derive(Component, Debug, Clone)]
pub struct BehaviorMachine {
    active: BehaviorKind,
    enabled: [bool; BehaviorKind::COUNT],
    /// Цель, выбранная arbiter'ом в этом тике
    pub target: Option<FusedTarget>,
    pub patrol: PatrolRoute,
    pub investigate: InvestigateData,
    pub melee: MeleeData,
    transitions: u64,
}

impl Default for BehaviorMachine {
    fn default() -> Self {
        Self::new(BehaviorKind::Idle)
    }
}

impl BehaviorMachine {
    pub fn new(start_state: BehaviorKind) -> Self {
        let mut enabled = [false; BehaviorKind::COUNT];
        enabled[start_state.index()] = true;

        Self {
            active: start_state,
            enabled,
            target: None,
            patrol: PatrolRoute::default(),
            investigate: InvestigateData::default(),
            melee: MeleeData::default(),
            transitions: 0,
        }
    }

    pub fn with_patrol_route(mut self, route: PatrolRoute) -> Self {
        self.patrol = route;
        self
    }

    pub fn with_melee(mut self, melee: MeleeData) -> Self {
        self.melee = melee;
        self
    }

    pub fn active(&self) -> BehaviorKind {
        self.active
    }

    pub fn is_active(&self, kind: BehaviorKind) -> bool {
        self.enabled[kind.index()]
    }

    /// Сколько состояний enabled (всегда 1)
    pub fn active_count(&self) -> usize {
        self.enabled.iter().filter(|enabled| **enabled).count()
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Enter hook стартового состояния (вызывается один раз на spawn)
    pub fn enter_start_state(&mut self) -> HookOutput {
        let mut output = HookOutput::default();
        (HOOKS[self.active.index()].enter)(self, &mut output);
        output
    }

    /// Переход в `next`
    ///
    /// Переход в уже активное состояние — no-op (None, без exit/enter).
    pub fn transition(&mut self, next: BehaviorKind) -> Option<HookOutput> {
        if next == self.active {
            return None;
        }

        let mut output = HookOutput::default();
        (HOOKS[self.active.index()].exit)(self, &mut output);

        for kind in BehaviorKind::ALL {
            self.enabled[kind.index()] = kind == next;
        }
        self.active = next;
        (HOOKS[next.index()].enter)(self, &mut output);

        self.transitions += 1;
        Some(output)
    }
}
