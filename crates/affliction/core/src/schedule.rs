//! Time Progression Scheduler.
//!
//! Once per simulation tick, advances every instance whose interval has
//! elapsed since its last progression. Stages never pass `max_stage` and a
//! second update within the same tick finds nothing due.

use tracing::debug;

use crate::host::EntityHost;
use crate::ids::{EffectTypeId, EntityId, Stage, Tick};
use crate::manager::{EffectManager, StageChange};

/// One automatic advancement performed by [`TimeProgression::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    pub entity: EntityId,
    pub type_id: EffectTypeId,
    pub from: Stage,
    pub to: Stage,
}

#[derive(Clone, Copy, Debug)]
pub struct TimeProgression {
    enabled: bool,
}

impl Default for TimeProgression {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TimeProgression {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Advances every due instance of `entities` by one stage.
    pub fn update(
        &self,
        manager: &mut EffectManager,
        host: &mut dyn EntityHost,
        entities: &[EntityId],
        now: Tick,
    ) -> Vec<Progression> {
        if !self.enabled {
            return Vec::new();
        }

        let mut progressions = Vec::new();
        for &entity in entities {
            if !host.contains(entity) {
                debug!(%entity, "skipping progression of entity not known to host");
                continue;
            }
            for type_id in due(manager, entity, now) {
                let Ok(outcome) = manager.advance(host, entity, type_id.as_str(), 1, now) else {
                    continue;
                };
                manager.mark_progressed(entity, type_id.as_str(), now);

                let to = outcome.stage();
                if let StageChange::Changed { from, .. } = outcome.change {
                    debug!(%entity, %type_id, from, to, %now, "time progression");
                    progressions.push(Progression {
                        entity,
                        type_id,
                        from,
                        to,
                    });
                }
            }
        }
        progressions
    }

    /// Runs [`update`](Self::update) over every afflicted entity.
    pub fn update_all(
        &self,
        manager: &mut EffectManager,
        host: &mut dyn EntityHost,
        now: Tick,
    ) -> Vec<Progression> {
        let entities = manager.afflicted();
        self.update(manager, host, &entities, now)
    }
}

/// Types of `entity` below max stage whose interval has elapsed.
fn due(manager: &EffectManager, entity: EntityId, now: Tick) -> Vec<EffectTypeId> {
    let catalog = manager.catalog();
    manager
        .instances(entity)
        .filter(|instance| {
            let Some(definition) = catalog.get(instance.type_id.as_str()) else {
                return false;
            };
            if definition.is_max(instance.stage) {
                return false;
            }
            definition
                .interval_at(instance.stage)
                .is_some_and(|interval| now.since(instance.last_progression) >= interval)
        })
        .map(|instance| instance.type_id.clone())
        .collect()
}
