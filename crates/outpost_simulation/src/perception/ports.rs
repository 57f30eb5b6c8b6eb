//! Perception ports: Sight и Hearing
//!
//! Порт = упорядоченный snapshot того, что агент видит/слышит в этом тике.
//! Порядок задаёт host (VisionCone/Audition) и он ВАЖЕН: arbiter берёт
//! первого врага по порядку порта, а не ближайшего.

use bevy::prelude::*;

use crate::components::Actor;

/// Воспринимаемая entity (core ей не владеет)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceivedEntity {
    pub entity: Entity,
    pub faction_id: u64,
    /// Позиция на момент тика (обновляется refresh_perceived_positions)
    pub position: Vec3,
}

impl PerceivedEntity {
    pub fn new(entity: Entity, faction_id: u64, position: Vec3) -> Self {
        Self {
            entity,
            faction_id,
            position,
        }
    }
}

/// Общий API портов (для arbiter'а оба канала выглядят одинаково)
pub trait PerceptionPort {
    fn entries(&self) -> &[PerceivedEntity];
    fn entries_mut(&mut self) -> &mut Vec<PerceivedEntity>;

    /// Первый по порядку порта entity другой фракции
    fn first_hostile(&self, own_faction: u64) -> Option<&PerceivedEntity> {
        let observer = Actor::new(own_faction);
        self.entries()
            .iter()
            .find(|perceived| observer.is_hostile_to(perceived.faction_id))
    }

    fn contains(&self, entity: Entity) -> bool {
        self.entries().iter().any(|perceived| perceived.entity == entity)
    }

    /// Добавить в конец (дубликаты игнорируются, порядок сохраняется)
    fn insert(&mut self, perceived: PerceivedEntity) -> bool {
        if self.contains(perceived.entity) {
            return false;
        }
        self.entries_mut().push(perceived);
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let entries = self.entries_mut();
        let before = entries.len();
        entries.retain(|perceived| perceived.entity != entity);
        entries.len() != before
    }

    fn clear(&mut self) {
        self.entries_mut().clear();
    }
}

/// Sight port: видимые сейчас entity
#[derive(Component, Debug, Clone, Default)]
pub struct SightPort {
    pub visible: Vec<PerceivedEntity>,
}

impl PerceptionPort for SightPort {
    fn entries(&self) -> &[PerceivedEntity] {
        &self.visible
    }

    fn entries_mut(&mut self) -> &mut Vec<PerceivedEntity> {
        &mut self.visible
    }
}

/// Hearing port: слышимые сейчас entity
#[derive(Component, Debug, Clone, Default)]
pub struct HearingPort {
    pub audible: Vec<PerceivedEntity>,
}

impl PerceptionPort for HearingPort {
    fn entries(&self) -> &[PerceivedEntity] {
        &self.audible
    }

    fn entries_mut(&mut self) -> &mut Vec<PerceivedEntity> {
        &mut self.audible
    }
}
