//! Modifier Aggregator - combined effect of every active affliction.
//!
//! Stateless and recomputed on every call from the current instances, so a
//! query never observes stale modifiers and never triggers side effects.
//!
//! Combination rules:
//! - stat multipliers multiply, rate additives and movement deltas add
//! - behavior overrides resolve to the greatest [`BehaviorOverride`]
//! - visual overlays resolve by priority, then by smallest type id
//! - stumble chance is the largest single chance
//! - a restriction of any active stage applies

use strum::{AsRefStr, Display, EnumString};

use crate::catalog::{
    BehaviorOverride, EffectCatalog, EffectTypeDefinition, EquipCandidate, StageConfig, Tint,
    VisualOverlay,
};
use crate::ids::{AbilityId, EffectTypeId, EntityId, Stage};
use crate::rng::RngOracle;
use crate::store::{EffectInstance, InstanceStore};

/// Which presentation asset a sprite name is requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpriteKind {
    Character,
    Face,
    Battler,
}

/// The overlay that won resolution, with its source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveOverlay<'a> {
    pub type_id: &'a EffectTypeId,
    pub stage: Stage,
    pub priority: i32,
    pub overlay: &'a VisualOverlay,
}

/// Active instance joined with its definition and current stage config.
struct Layer<'a> {
    instance: &'a EffectInstance,
    definition: &'a EffectTypeDefinition,
    config: &'a StageConfig,
}

/// Read-only view over the store answering modifier queries.
#[derive(Clone, Copy)]
pub struct ModifierAggregator<'a> {
    catalog: &'a EffectCatalog,
    store: &'a InstanceStore,
}

impl<'a> ModifierAggregator<'a> {
    pub fn new(catalog: &'a EffectCatalog, store: &'a InstanceStore) -> Self {
        Self { catalog, store }
    }

    fn layers(&self, entity: EntityId) -> impl Iterator<Item = Layer<'a>> + 'a {
        let catalog = self.catalog;
        self.store.instances(entity).filter_map(move |instance| {
            let definition = catalog.get(instance.type_id.as_str())?;
            let config = definition.stage(instance.stage)?;
            Some(Layer {
                instance,
                definition,
                config,
            })
        })
    }

    /// Product of the stat multipliers of every active stage. 1 when none.
    pub fn stat_multiplier(&self, entity: EntityId, stat: &str) -> f64 {
        self.layers(entity)
            .map(|layer| layer.config.stat_multiplier(stat))
            .product()
    }

    /// Sum of the rate deltas of every active stage. 0 when none.
    pub fn rate_additive(&self, entity: EntityId, rate: &str) -> f64 {
        self.layers(entity)
            .map(|layer| layer.config.rate_additive(rate))
            .sum()
    }

    pub fn movement_delta(&self, entity: EntityId) -> i32 {
        self.layers(entity)
            .map(|layer| layer.config.movement_delta)
            .fold(0i32, i32::saturating_add)
    }

    pub fn behavior_override(&self, entity: EntityId) -> BehaviorOverride {
        self.layers(entity)
            .map(|layer| layer.config.behavior)
            .max()
            .unwrap_or_default()
    }

    pub fn can_control(&self, entity: EntityId) -> bool {
        self.behavior_override(entity).allows_control()
    }

    /// Winning overlay: highest priority (an unset priority counts as the
    /// stage number), ties to the lexically smallest type id.
    pub fn visual_overlay(&self, entity: EntityId) -> Option<ActiveOverlay<'a>> {
        let mut best: Option<ActiveOverlay<'a>> = None;
        for layer in self.layers(entity) {
            let Some(overlay) = layer.config.visual.as_ref() else {
                continue;
            };
            let priority = overlay
                .priority
                .unwrap_or_else(|| i32::from(layer.instance.stage));
            // Instances come in lexical order: keep the first on ties.
            if best.is_none_or(|current| priority > current.priority) {
                best = Some(ActiveOverlay {
                    type_id: &layer.definition.id,
                    stage: layer.instance.stage,
                    priority,
                    overlay,
                });
            }
        }
        best
    }

    pub fn tint(&self, entity: EntityId) -> Option<Tint> {
        self.visual_overlay(entity)
            .and_then(|active| active.overlay.tint)
    }

    /// Largest stumble chance among active stages.
    pub fn stumble_chance(&self, entity: EntityId) -> f64 {
        self.layers(entity)
            .map(|layer| layer.config.stumble_chance)
            .fold(0.0, f64::max)
    }

    /// Rolls a stumble for one map step.
    pub fn should_stumble(&self, entity: EntityId, rng: &dyn RngOracle, seed: u64) -> bool {
        let chance = self.stumble_chance(entity);
        chance > 0.0 && rng.chance(seed, chance)
    }

    /// False when any active stage forbids the item or its equipment type.
    pub fn can_equip(&self, entity: EntityId, candidate: &EquipCandidate) -> bool {
        !self
            .layers(entity)
            .any(|layer| layer.config.restrictions.forbids(candidate))
    }

    pub fn is_ability_sealed(&self, entity: EntityId, ability: AbilityId) -> bool {
        self.layers(entity)
            .any(|layer| layer.config.restrictions.seals(ability))
    }

    /// Sprite asset name for `kind`: the winning overlay's explicit override,
    /// else `base` plus its suffix, else `base`.
    pub fn sprite_name(&self, entity: EntityId, kind: SpriteKind, base: &str) -> String {
        let Some(active) = self.visual_overlay(entity) else {
            return base.to_string();
        };
        let overlay = active.overlay;
        let explicit = match kind {
            SpriteKind::Character => overlay.character_name.as_deref(),
            SpriteKind::Face => overlay.face_name.as_deref(),
            SpriteKind::Battler => overlay.battler_name.as_deref(),
        };
        match (explicit, overlay.suffix.as_deref()) {
            (Some(name), _) => name.to_string(),
            (None, Some(suffix)) => format!("{base}{suffix}"),
            (None, None) => base.to_string(),
        }
    }

    /// Sheet index override of the winning overlay. Battlers have none.
    pub fn overlay_index(&self, entity: EntityId, kind: SpriteKind) -> Option<u8> {
        let overlay = self.visual_overlay(entity)?.overlay;
        match kind {
            SpriteKind::Character => overlay.character_index,
            SpriteKind::Face => overlay.face_index,
            SpriteKind::Battler => None,
        }
    }

    /// Expands `{base}`, `{type}` and `{stage}` in `format` from the
    /// highest-stage instance (ties to the smallest type id). `{type}` is the
    /// type's sprite key, or its id when it has none.
    pub fn build_sprite_name(&self, entity: EntityId, base: &str, format: &str) -> String {
        let mut primary: Option<Layer<'a>> = None;
        for layer in self.layers(entity) {
            if primary
                .as_ref()
                .is_none_or(|current| layer.instance.stage > current.instance.stage)
            {
                primary = Some(layer);
            }
        }

        let (type_name, stage) = match &primary {
            Some(layer) => (
                layer
                    .definition
                    .sprite_key
                    .as_deref()
                    .unwrap_or(layer.definition.id.as_str()),
                layer.instance.stage.to_string(),
            ),
            None => ("", String::new()),
        };

        format
            .replace("{base}", base)
            .replace("{type}", type_name)
            .replace("{stage}", &stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, ItemRef, StageRestrictions};
    use crate::ids::{EquipTypeId, Tick};

    fn catalog() -> EffectCatalog {
        let mut builder = CatalogBuilder::new();
        builder
            .register(
                EffectTypeDefinition::new(
                    "slime",
                    "Slime",
                    vec![
                        StageConfig::new().visual(VisualOverlay::with_suffix("_S1")),
                        StageConfig::new()
                            .movement(-1)
                            .stumble(0.1)
                            .visual(VisualOverlay::with_suffix("_S2")),
                    ],
                )
                .with_sprite_key("S"),
            )
            .unwrap()
            .register(EffectTypeDefinition::new(
                "hypnosis",
                "Hypnosis",
                vec![
                    StageConfig::new()
                        .stat("atk", 0.9)
                        .behavior(BehaviorOverride::RandomMove)
                        .visual(VisualOverlay {
                            face_name: Some("Hero_hypno".into()),
                            face_index: Some(3),
                            ..VisualOverlay::default()
                        }),
                    StageConfig::new()
                        .stat("atk", 0.8)
                        .stumble(0.25)
                        .behavior(BehaviorOverride::Charmed)
                        .restrictions(StageRestrictions {
                            forbidden_equip_types: vec![EquipTypeId(1)],
                            sealed_abilities: vec![AbilityId(4)],
                            ..StageRestrictions::default()
                        }),
                ],
            ))
            .unwrap();
        builder.build()
    }

    fn store(entries: &[(&str, Stage)]) -> InstanceStore {
        let mut store = InstanceStore::new();
        for (id, stage) in entries {
            store.insert(
                EntityId(0),
                EffectInstance::new(EffectTypeId::new(*id), *stage, Tick::ZERO),
            );
        }
        store
    }

    #[test]
    fn no_afflictions_means_neutral_modifiers() {
        let catalog = catalog();
        let store = store(&[]);
        let agg = ModifierAggregator::new(&catalog, &store);
        let hero = EntityId(0);

        assert_eq!(agg.stat_multiplier(hero, "atk"), 1.0);
        assert_eq!(agg.rate_additive(hero, "eva"), 0.0);
        assert_eq!(agg.movement_delta(hero), 0);
        assert!(agg.can_control(hero));
        assert!(agg.visual_overlay(hero).is_none());
        assert_eq!(agg.sprite_name(hero, SpriteKind::Character, "Hero"), "Hero");
        assert_eq!(agg.build_sprite_name(hero, "Hero", "{base}{type}{stage}"), "Hero");
    }

    #[test]
    fn equal_priority_overlays_resolve_to_smallest_type_id() {
        let catalog = catalog();
        let store = store(&[("slime", 1), ("hypnosis", 1)]);
        let agg = ModifierAggregator::new(&catalog, &store);

        let active = agg.visual_overlay(EntityId(0)).unwrap();
        assert_eq!(active.type_id.as_str(), "hypnosis");
        assert_eq!(active.priority, 1);
        assert_eq!(agg.sprite_name(EntityId(0), SpriteKind::Face, "Hero"), "Hero_hypno");
        assert_eq!(agg.overlay_index(EntityId(0), SpriteKind::Face), Some(3));
        assert_eq!(agg.sprite_name(EntityId(0), SpriteKind::Character, "Hero"), "Hero");
    }

    #[test]
    fn higher_stage_overlay_wins_without_explicit_priority() {
        let catalog = catalog();
        let store = store(&[("slime", 2), ("hypnosis", 1)]);
        let agg = ModifierAggregator::new(&catalog, &store);

        assert_eq!(
            agg.sprite_name(EntityId(0), SpriteKind::Character, "Hero"),
            "Hero_S2"
        );
        assert_eq!(agg.build_sprite_name(EntityId(0), "Hero", "{base}{type}{stage}"), "HeroS2");
    }

    #[test]
    fn stumble_takes_the_largest_chance() {
        let catalog = catalog();
        let store = store(&[("slime", 2), ("hypnosis", 2)]);
        let agg = ModifierAggregator::new(&catalog, &store);
        assert_eq!(agg.stumble_chance(EntityId(0)), 0.25);
    }

    #[test]
    fn restrictions_apply_from_any_stage() {
        let catalog = catalog();
        let store = store(&[("slime", 1), ("hypnosis", 2)]);
        let agg = ModifierAggregator::new(&catalog, &store);
        let hero = EntityId(0);

        let sword = EquipCandidate {
            item: ItemRef::Weapon(3),
            equip_type: EquipTypeId(1),
        };
        let staff = EquipCandidate {
            item: ItemRef::Weapon(4),
            equip_type: EquipTypeId(2),
        };
        assert!(!agg.can_equip(hero, &sword));
        assert!(agg.can_equip(hero, &staff));
        assert!(agg.is_ability_sealed(hero, AbilityId(4)));
        assert!(!agg.is_ability_sealed(hero, AbilityId(5)));
        assert_eq!(agg.behavior_override(hero), BehaviorOverride::Charmed);
    }

    #[test]
    fn sprite_kind_parses_case_insensitively() {
        assert_eq!("Face".parse::<SpriteKind>(), Ok(SpriteKind::Face));
        assert_eq!(SpriteKind::Battler.as_ref(), "battler");
    }
}
