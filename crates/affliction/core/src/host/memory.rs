//! In-memory host for tests, tools and the demo binary.

use std::collections::{BTreeMap, BTreeSet};

use super::{EntityHost, RoleLearning};
use crate::ids::{AbilityId, EntityId, RoleId, TagId, TemplateId};

/// Entity record kept by [`MemoryHost`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryEntity {
    pub name: String,
    pub tags: BTreeSet<TagId>,
    pub role: Option<RoleId>,
    pub level: u32,
    pub abilities: BTreeSet<AbilityId>,
    pub hp: i32,
    /// Set on entities created through [`EntityHost::spawn_hostile`].
    pub template: Option<TemplateId>,
    /// Whether the last role change kept progress.
    pub kept_progress: Option<bool>,
}

/// Simple host: a map of entities, one party, one optional encounter.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    entities: BTreeMap<EntityId, MemoryEntity>,
    roles: BTreeMap<RoleId, Vec<RoleLearning>>,
    party: Vec<EntityId>,
    hostiles: Vec<EntityId>,
    encounter_active: bool,
    next_id: u32,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a party member and returns its id.
    pub fn spawn_member(&mut self, name: &str, level: u32, hp: i32) -> EntityId {
        let id = self.allocate();
        self.entities.insert(
            id,
            MemoryEntity {
                name: name.to_string(),
                level,
                hp,
                ..MemoryEntity::default()
            },
        );
        self.party.push(id);
        id
    }

    /// Declares the abilities a role teaches.
    pub fn define_role(&mut self, role: RoleId, learnings: Vec<RoleLearning>) {
        self.roles.insert(role, learnings);
    }

    pub fn set_encounter_active(&mut self, active: bool) {
        self.encounter_active = active;
        if !active {
            self.hostiles.clear();
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&MemoryEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut MemoryEntity> {
        self.entities.get_mut(&id)
    }

    /// Hostiles registered with the current encounter, in spawn order.
    pub fn hostiles(&self) -> &[EntityId] {
        &self.hostiles
    }

    pub fn party(&self) -> &[EntityId] {
        &self.party
    }

    /// Removes an entity from the host entirely.
    pub fn despawn(&mut self, id: EntityId) {
        self.entities.remove(&id);
        self.party.retain(|member| *member != id);
        self.hostiles.retain(|hostile| *hostile != id);
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl EntityHost for MemoryHost {
    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn has_tag(&self, entity: EntityId, tag: TagId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|e| e.tags.contains(&tag))
    }

    fn add_tag(&mut self, entity: EntityId, tag: TagId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.tags.insert(tag);
        }
    }

    fn remove_tag(&mut self, entity: EntityId, tag: TagId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.tags.remove(&tag);
        }
    }

    fn current_role(&self, entity: EntityId) -> Option<RoleId> {
        self.entities.get(&entity).and_then(|e| e.role)
    }

    fn set_role(&mut self, entity: EntityId, role: RoleId, keep_progress: bool) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.role = Some(role);
            e.kept_progress = Some(keep_progress);
            if !keep_progress {
                e.level = 1;
            }
        }
    }

    fn level(&self, entity: EntityId) -> u32 {
        self.entities.get(&entity).map_or(0, |e| e.level)
    }

    fn role_abilities(&self, role: RoleId) -> Vec<RoleLearning> {
        self.roles.get(&role).cloned().unwrap_or_default()
    }

    fn grant_ability(&mut self, entity: EntityId, ability: AbilityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.abilities.insert(ability);
        }
    }

    fn forget_ability(&mut self, entity: EntityId, ability: AbilityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.abilities.remove(&ability);
        }
    }

    fn name(&self, entity: EntityId) -> Option<String> {
        self.entities.get(&entity).map(|e| e.name.clone())
    }

    fn is_in_encounter(&self, entity: EntityId) -> bool {
        self.encounter_active && self.entities.contains_key(&entity)
    }

    fn spawn_hostile(&mut self, template: TemplateId, name: Option<&str>) -> Option<EntityId> {
        if !self.encounter_active {
            return None;
        }
        let id = self.allocate();
        self.entities.insert(
            id,
            MemoryEntity {
                name: name.map_or_else(|| format!("hostile-{}", template), str::to_string),
                level: 1,
                hp: 1,
                template: Some(template),
                ..MemoryEntity::default()
            },
        );
        self.hostiles.push(id);
        Some(id)
    }

    fn drain(&mut self, entity: EntityId, amount: i32) -> bool {
        match self.entities.get_mut(&entity) {
            Some(e) if e.hp > 0 => {
                e.hp = (e.hp - amount).max(0);
                e.hp == 0
            }
            _ => false,
        }
    }

    fn party_members(&self, entity: EntityId) -> Vec<EntityId> {
        if self.party.contains(&entity) {
            self.party.clone()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostiles_only_spawn_during_encounters() {
        let mut host = MemoryHost::new();
        assert_eq!(host.spawn_hostile(TemplateId(6), Some("Ann")), None);

        host.set_encounter_active(true);
        let hostile = host.spawn_hostile(TemplateId(6), Some("Ann")).unwrap();
        assert_eq!(host.hostiles(), &[hostile]);
        assert_eq!(host.name(hostile).as_deref(), Some("Ann"));
    }

    #[test]
    fn drain_reports_depletion_once() {
        let mut host = MemoryHost::new();
        let id = host.spawn_member("Ann", 1, 5);
        assert!(!host.drain(id, 3));
        assert!(host.drain(id, 3));
        assert!(!host.drain(id, 3));
    }
}
