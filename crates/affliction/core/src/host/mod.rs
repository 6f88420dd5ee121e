//! Entity collaborator interface.
//!
//! The engine never owns entities. Everything it needs to read or change on
//! them (state tags, roles, abilities, encounter membership) goes through
//! [`EntityHost`], addressed by [`EntityId`].

pub mod memory;

pub use memory::MemoryHost;

use crate::ids::{AbilityId, EntityId, RoleId, TagId, TemplateId};

/// Ability a role teaches once the entity reaches `level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleLearning {
    pub level: u32,
    pub ability: AbilityId,
}

/// Host simulation services consumed by the engine.
///
/// Calls addressed to an entity the host does not know should be no-ops;
/// the engine checks [`EntityHost::contains`] before touching an entity.
pub trait EntityHost {
    /// Whether `entity` currently exists in the host.
    fn contains(&self, entity: EntityId) -> bool;

    fn has_tag(&self, entity: EntityId, tag: TagId) -> bool;
    fn add_tag(&mut self, entity: EntityId, tag: TagId);
    fn remove_tag(&mut self, entity: EntityId, tag: TagId);

    fn current_role(&self, entity: EntityId) -> Option<RoleId>;
    fn set_role(&mut self, entity: EntityId, role: RoleId, keep_progress: bool);

    /// Progression level used to re-derive role abilities.
    fn level(&self, entity: EntityId) -> u32;

    /// Abilities a role teaches, with the level each one unlocks at.
    fn role_abilities(&self, role: RoleId) -> Vec<RoleLearning>;

    fn grant_ability(&mut self, entity: EntityId, ability: AbilityId);
    fn forget_ability(&mut self, entity: EntityId, ability: AbilityId);

    fn name(&self, entity: EntityId) -> Option<String>;

    /// Whether `entity` is part of an active encounter (battle).
    fn is_in_encounter(&self, entity: EntityId) -> bool;

    /// Instantiates a hostile from `template` and registers it with the
    /// active encounter's hostile roster. Returns `None` when the host
    /// cannot spawn one.
    fn spawn_hostile(&mut self, template: TemplateId, name: Option<&str>) -> Option<EntityId>;

    /// Reduces the entity's health by `amount`. Returns true when this left
    /// the entity depleted.
    fn drain(&mut self, _entity: EntityId, _amount: i32) -> bool {
        false
    }

    /// Entities sharing `entity`'s party, including `entity` itself.
    fn party_members(&self, _entity: EntityId) -> Vec<EntityId> {
        Vec::new()
    }
}
