//! Effect Manager - the only writer of affliction state.
//!
//! Every mutation follows the same pipeline:
//!
//! 1. Resolve the type in the catalog and the entity in the host
//! 2. Clamp the requested stage and short-circuit when nothing changes
//! 3. Write the instance and resynchronize the linked state tags
//! 4. Fire lifecycle callbacks (`on_apply`/`on_advance`, then `on_max_stage`)
//! 5. Run the transform of the stage just entered
//! 6. Mark the entity for refresh and record events

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::aggregate::ModifierAggregator;
use crate::catalog::{CallbackContext, EffectCatalog, EffectTypeDefinition};
use crate::config::EngineConfig;
use crate::error::AfflictionError;
use crate::events::{AfflictionEvent, EventQueue, RefreshFlags};
use crate::host::EntityHost;
use crate::ids::{EffectTypeId, EntityId, Stage, TagId, Tick};
use crate::store::{EffectInstance, EntityAfflictions, InstanceStore};
use crate::transform::{TransformExecutor, TransformReport, TransformTarget};

/// Stage transition produced by an apply/advance call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageChange {
    /// The entity was already at the target stage. Nothing ran.
    Unchanged(Stage),
    /// First activation of the type.
    Applied(Stage),
    /// Existing instance moved to another stage.
    Changed { from: Stage, to: Stage },
}

impl StageChange {
    /// Stage the entity is at after the call.
    pub fn stage(self) -> Stage {
        match self {
            Self::Unchanged(stage) | Self::Applied(stage) => stage,
            Self::Changed { to, .. } => to,
        }
    }

    pub fn is_unchanged(self) -> bool {
        matches!(self, Self::Unchanged(_))
    }
}

/// Result of a successful apply/advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub change: StageChange,
    /// Present when the entered stage carries a transform.
    pub transform: Option<TransformReport>,
}

impl ApplyOutcome {
    fn unchanged(stage: Stage) -> Self {
        Self {
            change: StageChange::Unchanged(stage),
            transform: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.change.stage()
    }
}

/// Owns the instance store and applies every stage change.
#[derive(Debug)]
pub struct EffectManager {
    catalog: Arc<EffectCatalog>,
    store: InstanceStore,
    events: EventQueue,
    transform: TransformExecutor,
}

impl EffectManager {
    pub fn new(catalog: Arc<EffectCatalog>, config: &EngineConfig) -> Self {
        Self {
            catalog,
            store: InstanceStore::new(),
            events: EventQueue::default(),
            transform: TransformExecutor::new(config.terminal_tag),
        }
    }

    pub fn catalog(&self) -> &Arc<EffectCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    /// Read-only modifier queries over the current state.
    pub fn aggregator(&self) -> ModifierAggregator<'_> {
        ModifierAggregator::new(&self.catalog, &self.store)
    }

    /// Sets `type_id` on `entity` to `requested`, clamped into `1..=max_stage`.
    pub fn apply(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        requested: i32,
        now: Tick,
    ) -> Result<ApplyOutcome, AfflictionError> {
        let catalog = Arc::clone(&self.catalog);
        let definition = Self::resolve(&catalog, host, entity, type_id)?;

        let target = definition.clamp_stage(requested);
        let previous = self.store.stage(entity, type_id);
        if previous == target {
            trace!(%entity, type_id, stage = target, "stage unchanged");
            return Ok(ApplyOutcome::unchanged(target));
        }

        self.store
            .insert(entity, EffectInstance::new(definition.id.clone(), target, now));
        sync_tags(host, definition, entity, target);

        if let Some(callbacks) = &definition.callbacks {
            let mut ctx = CallbackContext {
                host: &mut *host,
                entity,
                type_id: &definition.id,
                now,
            };
            if previous == 0 {
                callbacks.get().on_apply(&mut ctx, target);
            } else {
                callbacks.get().on_advance(&mut ctx, previous, target);
            }
            if definition.is_max(target) {
                callbacks.get().on_max_stage(&mut ctx);
            }
        }

        let change = if previous == 0 {
            debug!(%entity, type_id, stage = target, "affliction applied");
            self.events.push(AfflictionEvent::Applied {
                entity,
                type_id: definition.id.clone(),
                stage: target,
            });
            StageChange::Applied(target)
        } else {
            debug!(%entity, type_id, from = previous, to = target, "affliction stage changed");
            self.events.push(AfflictionEvent::StageChanged {
                entity,
                type_id: definition.id.clone(),
                from: previous,
                to: target,
            });
            StageChange::Changed {
                from: previous,
                to: target,
            }
        };
        if definition.is_max(target) {
            self.events.push(AfflictionEvent::MaxStageReached {
                entity,
                type_id: definition.id.clone(),
            });
        }

        let transform = definition
            .stage(target)
            .and_then(|config| config.transform.as_ref())
            .map(|action| {
                self.transform.execute(
                    &mut TransformTarget {
                        host: &mut *host,
                        store: &mut self.store,
                        events: &mut self.events,
                        entity,
                    },
                    action,
                )
            });

        self.events
            .mark_dirty(entity, RefreshFlags::VISUAL | RefreshFlags::STATS);

        Ok(ApplyOutcome { change, transform })
    }

    /// Moves `type_id` by `delta` stages. A never-applied pair behaves like
    /// `apply(delta)`.
    pub fn advance(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        delta: i32,
        now: Tick,
    ) -> Result<ApplyOutcome, AfflictionError> {
        let current = self.store.stage(entity, type_id);
        let requested = if current == 0 {
            delta
        } else {
            i32::from(current).saturating_add(delta)
        };
        self.apply(host, entity, type_id, requested, now)
    }

    /// Removes `type_id` from `entity`. Returns whether an instance existed.
    pub fn remove(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        now: Tick,
    ) -> Result<bool, AfflictionError> {
        let catalog = Arc::clone(&self.catalog);
        let Some(definition) = catalog.get(type_id) else {
            warn!(%entity, type_id, "remove of unknown effect type");
            return Err(AfflictionError::UnknownEffectType(EffectTypeId::new(type_id)));
        };

        if !host.contains(entity) {
            warn!(%entity, type_id, "remove on entity not known to host");
            return Err(AfflictionError::MissingEntity(entity));
        }

        let removed = self.store.remove(entity, type_id);
        clear_tags(host, definition, entity);
        let Some(instance) = removed else {
            return Ok(false);
        };

        if let Some(callbacks) = &definition.callbacks {
            callbacks.get().on_remove(&mut CallbackContext {
                host: &mut *host,
                entity,
                type_id: &definition.id,
                now,
            });
        }

        debug!(%entity, type_id, stage = instance.stage, "affliction removed");
        self.events.push(AfflictionEvent::Removed {
            entity,
            type_id: definition.id.clone(),
            stage: instance.stage,
        });
        self.events
            .mark_dirty(entity, RefreshFlags::VISUAL | RefreshFlags::STATS);
        Ok(true)
    }

    /// Removes every active type, in lexical type order.
    pub fn remove_all(&mut self, host: &mut dyn EntityHost, entity: EntityId, now: Tick) -> Vec<EffectTypeId> {
        let active: Vec<EffectTypeId> = self
            .store
            .instances(entity)
            .map(|instance| instance.type_id.clone())
            .collect();

        let mut removed = Vec::with_capacity(active.len());
        for type_id in active {
            // Types in the store are always registered.
            if let Ok(true) = self.remove(host, entity, type_id.as_str(), now) {
                removed.push(type_id);
            }
        }
        removed
    }

    pub fn stage(&self, entity: EntityId, type_id: &str) -> Stage {
        self.store.stage(entity, type_id)
    }

    pub fn is_active(&self, entity: EntityId, type_id: &str) -> bool {
        self.store.get(entity, type_id).is_some()
    }

    pub fn instances(&self, entity: EntityId) -> impl Iterator<Item = &EffectInstance> {
        self.store.instances(entity)
    }

    /// Entities with at least one active instance.
    pub fn afflicted(&self) -> Vec<EntityId> {
        self.store.afflicted().collect()
    }

    pub fn is_converted(&self, entity: EntityId) -> bool {
        self.store.converted(entity).is_some()
    }

    /// Undoes the terminal tag of a hostile conversion. Never called
    /// automatically.
    pub fn restore_converted(&mut self, host: &mut dyn EntityHost, entity: EntityId) -> Option<TagId> {
        self.transform
            .restore(host, &mut self.store, &mut self.events, entity)
    }

    /// Drops all bookkeeping for an entity the host destroyed. No callbacks
    /// fire and no host calls are made.
    pub fn forget_entity(&mut self, entity: EntityId) {
        if self.store.remove_entity(entity).is_some() {
            trace!(%entity, "entity forgotten");
        }
        self.events.forget(entity);
    }

    pub(crate) fn mark_progressed(&mut self, entity: EntityId, type_id: &str, now: Tick) {
        self.store.set_last_progression(entity, type_id, now);
    }

    pub fn drain_events(&mut self) -> Vec<AfflictionEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &[AfflictionEvent] {
        self.events.pending()
    }

    /// Takes the refresh flags of `entity`, clearing them.
    pub fn take_refresh(&mut self, entity: EntityId) -> RefreshFlags {
        self.events.take_refresh(entity)
    }

    pub fn take_dirty(&mut self) -> BTreeMap<EntityId, RefreshFlags> {
        self.events.take_dirty()
    }

    /// Persistence record of `entity`.
    pub fn export_entity(&self, entity: EntityId) -> EntityAfflictions {
        self.store.export(entity)
    }

    /// Restores a persistence record, reconciled against the catalog, and
    /// resynchronizes linked tags on the host. Returns dropped type ids.
    pub fn import_entity(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        record: EntityAfflictions,
    ) -> Vec<EffectTypeId> {
        let catalog = Arc::clone(&self.catalog);
        if host.contains(entity) {
            for instance in self.store.instances(entity) {
                if let Some(definition) = catalog.get(instance.type_id.as_str()) {
                    clear_tags(host, definition, entity);
                }
            }
            if let Some(tag) = self.store.converted(entity)
                && record.converted != Some(tag)
                && host.has_tag(entity, tag)
            {
                host.remove_tag(entity, tag);
            }
        }

        let dropped = self.store.import(&catalog, entity, record);
        for type_id in &dropped {
            warn!(%entity, %type_id, "dropping persisted affliction of unknown type");
        }

        if host.contains(entity) {
            for instance in self.store.instances(entity) {
                if let Some(definition) = catalog.get(instance.type_id.as_str()) {
                    sync_tags(host, definition, entity, instance.stage);
                }
            }
            if let Some(tag) = self.store.converted(entity) {
                host.add_tag(entity, tag);
            }
        }
        self.events
            .mark_dirty(entity, RefreshFlags::VISUAL | RefreshFlags::STATS);
        dropped
    }

    fn resolve<'c>(
        catalog: &'c EffectCatalog,
        host: &dyn EntityHost,
        entity: EntityId,
        type_id: &str,
    ) -> Result<&'c EffectTypeDefinition, AfflictionError> {
        let Some(definition) = catalog.get(type_id) else {
            warn!(%entity, type_id, "unknown effect type");
            return Err(AfflictionError::UnknownEffectType(EffectTypeId::new(type_id)));
        };
        if !host.contains(entity) {
            warn!(%entity, type_id, "entity not known to host");
            return Err(AfflictionError::MissingEntity(entity));
        }
        Ok(definition)
    }
}

/// Leaves exactly the tag of `stage` attached.
fn sync_tags(host: &mut dyn EntityHost, definition: &EffectTypeDefinition, entity: EntityId, stage: Stage) {
    let current = definition.tag_for(stage);
    for tag in definition.linked_tags() {
        if Some(tag) != current && host.has_tag(entity, tag) {
            host.remove_tag(entity, tag);
        }
    }
    if let Some(tag) = current
        && !host.has_tag(entity, tag)
    {
        host.add_tag(entity, tag);
    }
}

fn clear_tags(host: &mut dyn EntityHost, definition: &EffectTypeDefinition, entity: EntityId) {
    for tag in definition.linked_tags() {
        if host.has_tag(entity, tag) {
            host.remove_tag(entity, tag);
        }
    }
}
