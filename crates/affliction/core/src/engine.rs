//! Engine façade.
//!
//! [`AfflictionEngine`] bundles the manager, scheduler, configuration and RNG
//! oracle behind the command surface hosts call: programmatic operations,
//! parsed text commands, note-tag triggers and custom handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aggregate::ModifierAggregator;
use crate::catalog::EffectCatalog;
use crate::command::{Command, NoteTag, NoteTrigger};
use crate::config::EngineConfig;
use crate::error::AfflictionError;
use crate::events::{AfflictionEvent, RefreshFlags};
use crate::handlers::{HandlerArgs, HandlerContext, HandlerOutcome};
use crate::host::EntityHost;
use crate::ids::{EffectTypeId, EntityId, Stage, TagId, Tick};
use crate::manager::{ApplyOutcome, EffectManager};
use crate::rng::{PcgRng, RngOracle, RollContext, compute_seed};
use crate::schedule::{Progression, TimeProgression};
use crate::store::{EffectInstance, EntityAfflictions};

/// Debug view of one active affliction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveAffliction {
    pub type_id: EffectTypeId,
    pub name: String,
    pub stage: Stage,
    pub max_stage: Stage,
}

/// Debug view of one registered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredType {
    pub id: EffectTypeId,
    pub name: String,
    pub max_stage: Stage,
    pub progression_interval: Option<u64>,
}

/// What an executed text command did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Staged(ApplyOutcome),
    /// Removed type ids, empty when nothing was active.
    Removed(Vec<EffectTypeId>),
    TimeProgression(bool),
}

pub struct AfflictionEngine {
    config: EngineConfig,
    manager: EffectManager,
    scheduler: TimeProgression,
    rng: Box<dyn RngOracle>,
}

impl AfflictionEngine {
    pub fn new(catalog: Arc<EffectCatalog>, config: EngineConfig) -> Self {
        let manager = EffectManager::new(catalog, &config);
        let scheduler = TimeProgression::new(config.time_progression_enabled);
        Self {
            config,
            manager,
            scheduler,
            rng: Box::new(PcgRng),
        }
    }

    /// Replaces the default PCG oracle.
    pub fn with_rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<EffectCatalog> {
        self.manager.catalog()
    }

    pub fn manager(&self) -> &EffectManager {
        &self.manager
    }

    pub fn aggregator(&self) -> ModifierAggregator<'_> {
        self.manager.aggregator()
    }

    // ===== stage operations =====

    pub fn apply(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        stage: i32,
        now: Tick,
    ) -> Result<ApplyOutcome, AfflictionError> {
        self.manager.apply(host, entity, type_id, stage, now)
    }

    pub fn advance(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        delta: i32,
        now: Tick,
    ) -> Result<ApplyOutcome, AfflictionError> {
        self.manager.advance(host, entity, type_id, delta, now)
    }

    pub fn remove(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        type_id: &str,
        now: Tick,
    ) -> Result<bool, AfflictionError> {
        self.manager.remove(host, entity, type_id, now)
    }

    pub fn remove_all(&mut self, host: &mut dyn EntityHost, entity: EntityId, now: Tick) -> Vec<EffectTypeId> {
        self.manager.remove_all(host, entity, now)
    }

    pub fn stage(&self, entity: EntityId, type_id: &str) -> Stage {
        self.manager.stage(entity, type_id)
    }

    pub fn is_active(&self, entity: EntityId, type_id: &str) -> bool {
        self.manager.is_active(entity, type_id)
    }

    pub fn restore_converted(&mut self, host: &mut dyn EntityHost, entity: EntityId) -> Option<TagId> {
        self.manager.restore_converted(host, entity)
    }

    pub fn forget_entity(&mut self, entity: EntityId) {
        self.manager.forget_entity(entity);
    }

    // ===== party-wide operations =====

    /// Sets `type_id` to `stage` on every member of `member`'s party.
    pub fn apply_all(
        &mut self,
        host: &mut dyn EntityHost,
        member: EntityId,
        type_id: &str,
        stage: i32,
        now: Tick,
    ) -> Result<Vec<(EntityId, ApplyOutcome)>, AfflictionError> {
        if !self.manager.catalog().contains(type_id) {
            warn!(%member, type_id, "party-wide apply of unknown effect type");
            return Err(AfflictionError::UnknownEffectType(EffectTypeId::new(type_id)));
        }

        let mut applied = Vec::new();
        for entity in host.party_members(member) {
            let outcome = self.apply(host, entity, type_id, stage, now)?;
            applied.push((entity, outcome));
        }
        Ok(applied)
    }

    /// Removes every affliction from every member of `member`'s party.
    /// Members with nothing active are left out of the result.
    pub fn clear_all(
        &mut self,
        host: &mut dyn EntityHost,
        member: EntityId,
        now: Tick,
    ) -> BTreeMap<EntityId, Vec<EffectTypeId>> {
        let mut cleared = BTreeMap::new();
        for entity in host.party_members(member) {
            let removed = self.remove_all(host, entity, now);
            if !removed.is_empty() {
                cleared.insert(entity, removed);
            }
        }
        cleared
    }

    // ===== time progression =====

    pub fn time_progression_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn set_time_progression_enabled(&mut self, enabled: bool) {
        info!(enabled, "time progression toggled");
        self.scheduler.set_enabled(enabled);
    }

    /// Runs the scheduler over every afflicted entity.
    pub fn tick(&mut self, host: &mut dyn EntityHost, now: Tick) -> Vec<Progression> {
        self.scheduler.update_all(&mut self.manager, host, now)
    }

    /// Runs the scheduler over the given entities only.
    pub fn tick_entities(
        &mut self,
        host: &mut dyn EntityHost,
        entities: &[EntityId],
        now: Tick,
    ) -> Vec<Progression> {
        self.scheduler.update(&mut self.manager, host, entities, now)
    }

    // ===== rolls =====

    /// Rolls a stumble for map step `step` of `entity` at `now`.
    pub fn should_stumble(&self, entity: EntityId, now: Tick, step: u32) -> bool {
        let seed = compute_seed(self.config.rng_seed, now.0, entity.0, RollContext::Stumble, step);
        self.aggregator()
            .should_stumble(entity, self.rng.as_ref(), seed)
    }

    // ===== command surface =====

    pub fn execute(
        &mut self,
        host: &mut dyn EntityHost,
        command: &Command,
        now: Tick,
    ) -> Result<CommandOutcome, AfflictionError> {
        debug!(?command, "executing command");
        match command {
            Command::Apply {
                entity,
                type_id,
                stage,
            } => self
                .apply(host, *entity, type_id.as_str(), *stage, now)
                .map(CommandOutcome::Staged),
            Command::Advance {
                entity,
                type_id,
                amount,
            } => self
                .advance(host, *entity, type_id.as_str(), *amount, now)
                .map(CommandOutcome::Staged),
            Command::Remove {
                entity,
                type_id: Some(type_id),
            } => {
                let removed = self.remove(host, *entity, type_id.as_str(), now)?;
                Ok(CommandOutcome::Removed(if removed {
                    vec![type_id.clone()]
                } else {
                    Vec::new()
                }))
            }
            Command::Remove {
                entity,
                type_id: None,
            } => Ok(CommandOutcome::Removed(self.remove_all(host, *entity, now))),
            Command::TimeProgression(enabled) => {
                self.set_time_progression_enabled(*enabled);
                Ok(CommandOutcome::TimeProgression(*enabled))
            }
        }
    }

    /// Fires a note tag against `entity`. Returns `None` when an attack's
    /// chance roll failed.
    pub fn trigger_note(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        tag: &NoteTag,
        now: Tick,
    ) -> Result<Option<ApplyOutcome>, AfflictionError> {
        let type_id = tag.type_id.as_str();
        match tag.trigger {
            NoteTrigger::Touch => self.advance(host, entity, type_id, tag.stage, now).map(Some),
            NoteTrigger::Link => self.apply(host, entity, type_id, tag.stage, now).map(Some),
            NoteTrigger::Attack => {
                let seed = compute_seed(self.config.rng_seed, now.0, entity.0, RollContext::NoteAttack, 0);
                if !self.rng.chance(seed, tag.chance) {
                    debug!(%entity, type_id, chance = tag.chance, "note attack missed");
                    return Ok(None);
                }
                self.advance(host, entity, type_id, tag.stage, now).map(Some)
            }
        }
    }

    /// Runs the custom handler registered under `key`.
    pub fn invoke_handler(
        &mut self,
        key: &str,
        host: &mut dyn EntityHost,
        source: EntityId,
        args: &HandlerArgs,
        now: Tick,
    ) -> Result<HandlerOutcome, AfflictionError> {
        let handler = self
            .manager
            .catalog()
            .handler(key)
            .ok_or_else(|| AfflictionError::UnknownHandler(key.to_string()))?;

        let mut ctx = HandlerContext {
            manager: &mut self.manager,
            host,
            rng: self.rng.as_ref(),
            config: &self.config,
            source,
            now,
        };
        handler.invoke(&mut ctx, args)
    }

    // ===== introspection =====

    pub fn list_active(&self, entity: EntityId) -> Vec<&EffectInstance> {
        self.manager.instances(entity).collect()
    }

    pub fn describe(&self, entity: EntityId) -> Vec<ActiveAffliction> {
        let catalog = self.manager.catalog();
        self.manager
            .instances(entity)
            .filter_map(|instance| {
                let definition = catalog.get(instance.type_id.as_str())?;
                Some(ActiveAffliction {
                    type_id: instance.type_id.clone(),
                    name: definition.display_name().to_string(),
                    stage: instance.stage,
                    max_stage: definition.max_stage,
                })
            })
            .collect()
    }

    pub fn list_registered_types(&self) -> Vec<EffectTypeId> {
        self.manager.catalog().type_ids().cloned().collect()
    }

    pub fn describe_types(&self) -> Vec<RegisteredType> {
        self.manager
            .catalog()
            .types()
            .map(|definition| RegisteredType {
                id: definition.id.clone(),
                name: definition.display_name().to_string(),
                max_stage: definition.max_stage,
                progression_interval: definition.progression_interval,
            })
            .collect()
    }

    // ===== events & persistence =====

    pub fn drain_events(&mut self) -> Vec<AfflictionEvent> {
        self.manager.drain_events()
    }

    pub fn take_refresh(&mut self, entity: EntityId) -> RefreshFlags {
        self.manager.take_refresh(entity)
    }

    pub fn take_dirty(&mut self) -> BTreeMap<EntityId, RefreshFlags> {
        self.manager.take_dirty()
    }

    pub fn export_entity(&self, entity: EntityId) -> EntityAfflictions {
        self.manager.export_entity(entity)
    }

    pub fn import_entity(
        &mut self,
        host: &mut dyn EntityHost,
        entity: EntityId,
        record: EntityAfflictions,
    ) -> Vec<EffectTypeId> {
        self.manager.import_entity(host, entity, record)
    }
}

impl std::fmt::Debug for AfflictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfflictionEngine")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, EffectTypeDefinition, StageConfig};
    use crate::host::MemoryHost;

    struct Fixed(u32);

    impl RngOracle for Fixed {
        fn next_u32(&self, _seed: u64) -> u32 {
            self.0
        }
    }

    fn engine() -> AfflictionEngine {
        let mut builder = CatalogBuilder::new();
        builder
            .register(
                EffectTypeDefinition::new(
                    "slime",
                    "Slime Corruption",
                    vec![
                        StageConfig::new(),
                        StageConfig::new().stumble(0.5),
                        StageConfig::new(),
                    ],
                )
                .with_interval(100),
            )
            .unwrap()
            .with_builtin_handlers()
            .unwrap();
        AfflictionEngine::new(Arc::new(builder.build()), EngineConfig::default())
    }

    #[test]
    fn party_wide_apply_and_clear() {
        let mut engine = engine();
        let mut host = MemoryHost::new();
        let ann = host.spawn_member("Ann", 1, 10);
        let bea = host.spawn_member("Bea", 1, 10);

        let applied = engine.apply_all(&mut host, ann, "slime", 2, Tick(1)).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(engine.stage(ann, "slime"), 2);
        assert_eq!(engine.stage(bea, "slime"), 2);

        assert_eq!(
            engine.apply_all(&mut host, ann, "ghost", 1, Tick(1)).unwrap_err(),
            AfflictionError::UnknownEffectType("ghost".into())
        );

        engine.remove(&mut host, bea, "slime", Tick(2)).unwrap();
        let cleared = engine.clear_all(&mut host, bea, Tick(3));
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[&ann], vec![EffectTypeId::from("slime")]);
        assert!(engine.manager().afflicted().is_empty());
    }

    #[test]
    fn text_commands_drive_the_engine() {
        let mut engine = engine();
        let mut host = MemoryHost::new();
        let hero = host.spawn_member("Ann", 1, 10);

        let apply: Command = "COR APPLY 0 slime 2".parse().unwrap();
        engine.execute(&mut host, &apply, Tick(1)).unwrap();
        assert_eq!(engine.stage(hero, "slime"), 2);

        let off: Command = "COR TIMEPROGRESSION OFF".parse().unwrap();
        engine.execute(&mut host, &off, Tick(1)).unwrap();
        assert!(engine.tick(&mut host, Tick(1_000)).is_empty());

        let remove: Command = "COR REMOVE 0".parse().unwrap();
        let outcome = engine.execute(&mut host, &remove, Tick(2)).unwrap();
        assert_eq!(outcome, CommandOutcome::Removed(vec!["slime".into()]));
    }

    #[test]
    fn attack_note_respects_chance_roll() {
        let mut host = MemoryHost::new();
        let hero = host.spawn_member("Ann", 1, 10);
        let tag: NoteTag = "<CorruptAttack: slime, 1, 0.5>".parse().unwrap();

        let mut missing = engine().with_rng(Fixed(u32::MAX));
        assert_eq!(missing.trigger_note(&mut host, hero, &tag, Tick(1)), Ok(None));
        assert!(!missing.is_active(hero, "slime"));

        let mut hitting = engine().with_rng(Fixed(0));
        let outcome = hitting.trigger_note(&mut host, hero, &tag, Tick(1)).unwrap();
        assert_eq!(outcome.map(|o| o.stage()), Some(1));
    }

    #[test]
    fn unknown_handler_is_reported() {
        let mut engine = engine();
        let mut host = MemoryHost::new();
        let hero = host.spawn_member("Ann", 1, 10);
        assert_eq!(
            engine.invoke_handler("teleport", &mut host, hero, &HandlerArgs::default(), Tick(0)),
            Err(AfflictionError::UnknownHandler("teleport".into()))
        );
        assert!(
            engine
                .invoke_handler("drain", &mut host, hero, &HandlerArgs::amount(4), Tick(0))
                .is_ok()
        );
    }

    #[test]
    fn stumble_uses_engine_oracle() {
        let mut host = MemoryHost::new();
        let hero = host.spawn_member("Ann", 1, 10);
        let mut engine = engine().with_rng(Fixed(0));

        assert!(!engine.should_stumble(hero, Tick(1), 0));
        engine.apply(&mut host, hero, "slime", 2, Tick(1)).unwrap();
        assert!(engine.should_stumble(hero, Tick(1), 0));
    }

    #[test]
    fn describe_reports_names_and_bounds() {
        let mut engine = engine();
        let mut host = MemoryHost::new();
        let hero = host.spawn_member("Ann", 1, 10);
        engine.apply(&mut host, hero, "slime", 9, Tick(0)).unwrap();

        assert_eq!(
            engine.describe(hero),
            vec![ActiveAffliction {
                type_id: "slime".into(),
                name: "Slime Corruption".into(),
                stage: 3,
                max_stage: 3,
            }]
        );
        assert_eq!(engine.describe_types()[0].progression_interval, Some(100));
        assert_eq!(engine.list_registered_types(), vec![EffectTypeId::new("slime")]);
    }
}
