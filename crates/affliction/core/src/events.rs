//! Events and refresh flags published by the manager.
//!
//! Side effects the host has to react to (a new hostile joined the encounter,
//! a sprite must be redrawn) are never pushed into host subsystems directly.
//! The manager records them here and the host drains them after each call.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::ids::{EffectTypeId, EntityId, RoleId, Stage, TagId, TemplateId};

bitflags! {
    /// What the host should recompute for an entity after a stage change.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RefreshFlags: u8 {
        /// Sprite, face, battler or tint.
        const VISUAL = 1 << 0;
        /// Attribute multipliers, rates or movement.
        const STATS  = 1 << 1;
        /// Role or ability list.
        const ROLE   = 1 << 2;
    }
}

/// Observable outcome of an engine call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AfflictionEvent {
    Applied {
        entity: EntityId,
        type_id: EffectTypeId,
        stage: Stage,
    },
    StageChanged {
        entity: EntityId,
        type_id: EffectTypeId,
        from: Stage,
        to: Stage,
    },
    MaxStageReached {
        entity: EntityId,
        type_id: EffectTypeId,
    },
    Removed {
        entity: EntityId,
        type_id: EffectTypeId,
        stage: Stage,
    },
    RoleChanged {
        entity: EntityId,
        role: RoleId,
        keep_progress: bool,
    },
    /// A friendly entity was replaced by a hostile spawned into the encounter.
    EntityConverted {
        original: EntityId,
        spawned: EntityId,
        template: TemplateId,
    },
    ConversionRestored {
        entity: EntityId,
        tag: TagId,
    },
}

impl AfflictionEvent {
    /// Entity the event is about.
    pub fn entity(&self) -> EntityId {
        match self {
            Self::Applied { entity, .. }
            | Self::StageChanged { entity, .. }
            | Self::MaxStageReached { entity, .. }
            | Self::Removed { entity, .. }
            | Self::RoleChanged { entity, .. }
            | Self::ConversionRestored { entity, .. } => *entity,
            Self::EntityConverted { original, .. } => *original,
        }
    }
}

/// Pending events plus per-entity refresh flags.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<AfflictionEvent>,
    dirty: BTreeMap<EntityId, RefreshFlags>,
}

impl EventQueue {
    pub fn push(&mut self, event: AfflictionEvent) {
        self.events.push(event);
    }

    pub fn mark_dirty(&mut self, entity: EntityId, flags: RefreshFlags) {
        *self.dirty.entry(entity).or_default() |= flags;
    }

    pub fn is_dirty(&self, entity: EntityId) -> bool {
        self.dirty.contains_key(&entity)
    }

    pub fn pending(&self) -> &[AfflictionEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<AfflictionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Takes and clears the refresh flags of every dirty entity.
    pub fn take_dirty(&mut self) -> BTreeMap<EntityId, RefreshFlags> {
        std::mem::take(&mut self.dirty)
    }

    /// Takes and clears the refresh flags of one entity.
    pub fn take_refresh(&mut self, entity: EntityId) -> RefreshFlags {
        self.dirty.remove(&entity).unwrap_or_default()
    }

    pub fn forget(&mut self, entity: EntityId) {
        self.dirty.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_flags_accumulate_until_taken() {
        let mut queue = EventQueue::default();
        let hero = EntityId(2);
        queue.mark_dirty(hero, RefreshFlags::VISUAL);
        queue.mark_dirty(hero, RefreshFlags::ROLE);
        assert!(queue.is_dirty(hero));
        assert_eq!(
            queue.take_refresh(hero),
            RefreshFlags::VISUAL | RefreshFlags::ROLE
        );
        assert!(queue.take_refresh(hero).is_empty());
    }

    #[test]
    fn conversion_event_belongs_to_original() {
        let event = AfflictionEvent::EntityConverted {
            original: EntityId(1),
            spawned: EntityId(9),
            template: TemplateId(6),
        };
        assert_eq!(event.entity(), EntityId(1));
    }
}
