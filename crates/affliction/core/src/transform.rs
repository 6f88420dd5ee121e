//! Transform Executor - identity-level side effects of entering a stage.
//!
//! Runs only from the manager, once per stage-entry transition. Queries never
//! reach this module.

use tracing::{debug, info, warn};

use crate::catalog::{HostileConversion, RoleChange, TransformAction};
use crate::error::AfflictionError;
use crate::events::{AfflictionEvent, EventQueue, RefreshFlags};
use crate::host::EntityHost;
use crate::ids::{AbilityId, EntityId, RoleId, TagId};
use crate::store::InstanceStore;

/// What a transform actually did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub role_changed: Option<RoleId>,
    pub learned: Vec<AbilityId>,
    pub forgotten: Vec<AbilityId>,
    pub spawned: Option<EntityId>,
    /// Sub-action whose precondition did not hold. The rest still ran.
    pub skipped: Option<AfflictionError>,
}

impl TransformReport {
    pub fn is_empty(&self) -> bool {
        self.role_changed.is_none()
            && self.learned.is_empty()
            && self.forgotten.is_empty()
            && self.spawned.is_none()
            && self.skipped.is_none()
    }
}

/// Mutable state a transform touches.
pub struct TransformTarget<'a> {
    pub host: &'a mut dyn EntityHost,
    pub store: &'a mut InstanceStore,
    pub events: &'a mut EventQueue,
    pub entity: EntityId,
}

#[derive(Clone, Copy, Debug)]
pub struct TransformExecutor {
    default_terminal_tag: TagId,
}

impl TransformExecutor {
    pub fn new(default_terminal_tag: TagId) -> Self {
        Self {
            default_terminal_tag,
        }
    }

    /// Runs `action` for the stage the entity just entered.
    ///
    /// Order: role change, explicit learn list, explicit forget list, hostile
    /// conversion.
    pub fn execute(&self, target: &mut TransformTarget<'_>, action: &TransformAction) -> TransformReport {
        let mut report = TransformReport::default();

        if let Some(change) = action.role_change {
            self.change_role(target, change, &mut report);
        }

        for ability in &action.learn_abilities {
            target.host.grant_ability(target.entity, *ability);
            report.learned.push(*ability);
        }
        for ability in &action.forget_abilities {
            target.host.forget_ability(target.entity, *ability);
            report.forgotten.push(*ability);
        }
        if !action.learn_abilities.is_empty() || !action.forget_abilities.is_empty() {
            target.events.mark_dirty(target.entity, RefreshFlags::ROLE);
        }

        if let Some(conversion) = action.hostile_conversion {
            self.convert(target, conversion, &mut report);
        }

        report
    }

    fn change_role(&self, target: &mut TransformTarget<'_>, change: RoleChange, report: &mut TransformReport) {
        let entity = target.entity;
        target.host.set_role(entity, change.role, change.keep_progress);

        let level = target.host.level(entity);
        for learning in target.host.role_abilities(change.role) {
            if learning.level <= level {
                target.host.grant_ability(entity, learning.ability);
                report.learned.push(learning.ability);
            }
        }

        info!(%entity, role = %change.role, keep_progress = change.keep_progress, "role changed");
        report.role_changed = Some(change.role);
        target.events.push(AfflictionEvent::RoleChanged {
            entity,
            role: change.role,
            keep_progress: change.keep_progress,
        });
        target
            .events
            .mark_dirty(entity, RefreshFlags::ROLE | RefreshFlags::VISUAL | RefreshFlags::STATS);
    }

    fn convert(&self, target: &mut TransformTarget<'_>, conversion: HostileConversion, report: &mut TransformReport) {
        let entity = target.entity;

        if !target.host.is_in_encounter(entity) {
            debug!(%entity, template = %conversion.template, "hostile conversion skipped outside encounter");
            report.skipped = Some(AfflictionError::ConversionUnavailable(entity));
            return;
        }
        if let Some(tag) = target.store.converted(entity) {
            debug!(%entity, %tag, "entity already converted");
            return;
        }

        let name = if conversion.keep_name {
            target.host.name(entity)
        } else {
            None
        };
        let Some(spawned) = target.host.spawn_hostile(conversion.template, name.as_deref()) else {
            warn!(%entity, template = %conversion.template, "host refused to spawn converted hostile");
            report.skipped = Some(AfflictionError::ConversionUnavailable(entity));
            return;
        };

        let tag = conversion.terminal_tag.unwrap_or(self.default_terminal_tag);
        target.host.add_tag(entity, tag);
        target.store.mark_converted(entity, tag);

        info!(original = %entity, %spawned, template = %conversion.template, "entity converted");
        report.spawned = Some(spawned);
        target.events.push(AfflictionEvent::EntityConverted {
            original: entity,
            spawned,
            template: conversion.template,
        });
        target.events.mark_dirty(entity, RefreshFlags::VISUAL);
    }

    /// Undoes the terminal state left by a conversion. Returns the tag that
    /// was removed, `None` if the entity was not converted.
    pub fn restore(
        &self,
        host: &mut dyn EntityHost,
        store: &mut InstanceStore,
        events: &mut EventQueue,
        entity: EntityId,
    ) -> Option<TagId> {
        let tag = store.clear_converted(entity)?;
        host.remove_tag(entity, tag);
        info!(%entity, %tag, "conversion restored");
        events.push(AfflictionEvent::ConversionRestored { entity, tag });
        events.mark_dirty(entity, RefreshFlags::VISUAL);
        Some(tag)
    }
}
