//! AI decision-making module
//!
//! Decision arbiter (sight + hearing fusion → behavior state) и per-state логика.
//! Один тик AI:
//! 1. run_decision_arbiter — fusion, память цели, переход состояния
//! 2. run_behavior_states — логика активного состояния
//! 3. clear_memory_on_arrival — InvestigateLastPosition дошёл → память невалидна

use bevy::prelude::*;

pub mod arbiter;
pub mod behavior;
pub mod profile;
pub mod states;


// Re-export основных типов
pub use arbiter::{decide, fuse_target, run_decision_arbiter, BehaviorChanged, FusedTarget};
pub use behavior::{
    apply_hook_output, BehaviorHooks, BehaviorKind, BehaviorMachine, HookOutput, InvestigateData,
    MeleeData, PatrolRoute, TriggerIntent, HOOKS,
};
pub use profile::{AgentProfile, EngagementStyle, TargetMemory};
pub use states::{clear_memory_on_arrival, run_behavior_states, LastPositionReached};

use crate::{SimulationSet, SimulationTick};

/// AI Plugin
///
/// Регистрирует AI системы в `SimulationTick` (SimulationSet::Decision).
/// Arbiter всегда отрабатывает ДО логики нового состояния в том же тике.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BehaviorChanged>()
            .add_event::<LastPositionReached>();

        app.add_systems(
            SimulationTick,
            (
                run_decision_arbiter,
                run_behavior_states,
                clear_memory_on_arrival,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Decision),
        );
    }
}
