//! Effect Instance Store - per-entity active afflictions.
//!
//! The store is plain data: it maps `EntityId → (EffectTypeId → EffectInstance)`
//! and knows nothing about tags, callbacks or transforms. Only the manager
//! mutates it.

use std::collections::BTreeMap;

use crate::catalog::EffectCatalog;
use crate::ids::{EffectTypeId, EntityId, Stage, TagId, Tick};

/// One active effect type on one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstance {
    pub type_id: EffectTypeId,
    pub stage: Stage,
    /// Tick of the last apply/advance that changed the stage.
    pub applied_at: Tick,
    /// Tick the scheduler measures the next interval from.
    pub last_progression: Tick,
}

impl EffectInstance {
    pub fn new(type_id: EffectTypeId, stage: Stage, now: Tick) -> Self {
        Self {
            type_id,
            stage,
            applied_at: now,
            last_progression: now,
        }
    }
}

/// Everything the engine remembers about one entity. This is also the
/// persistence record hosts store next to their own entity data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntityAfflictions {
    pub instances: BTreeMap<EffectTypeId, EffectInstance>,
    /// Terminal tag placed by a hostile conversion, while still in effect.
    pub converted: Option<TagId>,
}

impl EntityAfflictions {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.converted.is_none()
    }
}

/// Per-entity instance map owned by the manager.
#[derive(Clone, Debug, Default)]
pub struct InstanceStore {
    entities: BTreeMap<EntityId, EntityAfflictions>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: EntityId, type_id: &str) -> Option<&EffectInstance> {
        self.entities.get(&entity)?.instances.get(type_id)
    }

    /// Current stage, 0 when the type is not active.
    pub fn stage(&self, entity: EntityId, type_id: &str) -> Stage {
        self.get(entity, type_id).map_or(0, |instance| instance.stage)
    }

    /// Active instances of `entity` in lexical type order.
    pub fn instances(&self, entity: EntityId) -> impl Iterator<Item = &EffectInstance> {
        self.entities
            .get(&entity)
            .into_iter()
            .flat_map(|record| record.instances.values())
    }

    /// Entities with at least one active instance, in id order.
    pub fn afflicted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|(_, record)| !record.instances.is_empty())
            .map(|(id, _)| *id)
    }

    /// Writes `instance`, replacing any previous one of the same type.
    pub fn insert(&mut self, entity: EntityId, instance: EffectInstance) -> Option<EffectInstance> {
        self.entities
            .entry(entity)
            .or_default()
            .instances
            .insert(instance.type_id.clone(), instance)
    }

    pub fn remove(&mut self, entity: EntityId, type_id: &str) -> Option<EffectInstance> {
        let record = self.entities.get_mut(&entity)?;
        let removed = record.instances.remove(type_id);
        if record.is_empty() {
            self.entities.remove(&entity);
        }
        removed
    }

    pub fn set_last_progression(&mut self, entity: EntityId, type_id: &str, now: Tick) {
        if let Some(instance) = self
            .entities
            .get_mut(&entity)
            .and_then(|record| record.instances.get_mut(type_id))
        {
            instance.last_progression = now;
        }
    }

    pub fn converted(&self, entity: EntityId) -> Option<TagId> {
        self.entities.get(&entity).and_then(|record| record.converted)
    }

    pub fn mark_converted(&mut self, entity: EntityId, tag: TagId) {
        self.entities.entry(entity).or_default().converted = Some(tag);
    }

    /// Clears the converted flag, returning the tag it carried.
    pub fn clear_converted(&mut self, entity: EntityId) -> Option<TagId> {
        let record = self.entities.get_mut(&entity)?;
        let tag = record.converted.take();
        if record.is_empty() {
            self.entities.remove(&entity);
        }
        tag
    }

    /// Drops everything known about `entity`.
    pub fn remove_entity(&mut self, entity: EntityId) -> Option<EntityAfflictions> {
        self.entities.remove(&entity)
    }

    pub fn export(&self, entity: EntityId) -> EntityAfflictions {
        self.entities.get(&entity).cloned().unwrap_or_default()
    }

    /// Replaces the record of `entity` with `record`, reconciled against the
    /// catalog: unknown types are dropped and stages are clamped. Returns the
    /// ids of dropped types.
    pub fn import(
        &mut self,
        catalog: &EffectCatalog,
        entity: EntityId,
        mut record: EntityAfflictions,
    ) -> Vec<EffectTypeId> {
        let mut dropped = Vec::new();
        record.instances.retain(|type_id, instance| {
            let Some(definition) = catalog.get(type_id.as_str()) else {
                dropped.push(type_id.clone());
                return false;
            };
            instance.type_id = type_id.clone();
            instance.stage = definition.clamp_stage(i32::from(instance.stage));
            true
        });

        if record.is_empty() {
            self.entities.remove(&entity);
        } else {
            self.entities.insert(entity, record);
        }
        dropped
    }
}
