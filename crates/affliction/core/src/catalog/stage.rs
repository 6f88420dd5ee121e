//! Per-stage configuration schema.
//!
//! Every field has a neutral default so content only spells out what a stage
//! actually changes. Validation happens once, at registration.

use std::collections::BTreeMap;

use super::behavior::BehaviorOverride;
use crate::ids::{AbilityId, EquipTypeId, RoleId, TagId, TemplateId};

/// Modifiers and side effects of one stage of an effect type.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StageConfig {
    /// Multiplicative stat modifiers (`"atk" → 0.9`). Absent stats count as 1.
    pub stat_multipliers: BTreeMap<String, f64>,

    /// Additive rate modifiers (`"eva" → -0.05`). Absent rates count as 0.
    pub rate_additives: BTreeMap<String, f64>,

    /// Movement speed delta (negative is slower).
    pub movement_delta: i32,

    pub behavior: BehaviorOverride,

    pub visual: Option<VisualOverlay>,

    /// Probability in `[0, 1]` that a map step turns into a stumble.
    pub stumble_chance: f64,

    pub restrictions: StageRestrictions,

    /// Identity-level side effects fired once on entering this stage.
    pub transform: Option<TransformAction>,

    /// Overrides the type's progression interval while at this stage.
    pub progression_interval: Option<u64>,
}

impl StageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stat(mut self, name: impl Into<String>, multiplier: f64) -> Self {
        self.stat_multipliers.insert(name.into(), multiplier);
        self
    }

    pub fn rate(mut self, name: impl Into<String>, delta: f64) -> Self {
        self.rate_additives.insert(name.into(), delta);
        self
    }

    pub fn movement(mut self, delta: i32) -> Self {
        self.movement_delta = delta;
        self
    }

    pub fn behavior(mut self, behavior: BehaviorOverride) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn visual(mut self, visual: VisualOverlay) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn stumble(mut self, chance: f64) -> Self {
        self.stumble_chance = chance;
        self
    }

    pub fn restrictions(mut self, restrictions: StageRestrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn transform(mut self, transform: TransformAction) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn interval(mut self, ticks: u64) -> Self {
        self.progression_interval = Some(ticks);
        self
    }

    /// Multiplier for `stat`, 1 when the stage does not touch it.
    pub fn stat_multiplier(&self, stat: &str) -> f64 {
        self.stat_multipliers.get(stat).copied().unwrap_or(1.0)
    }

    /// Additive delta for `rate`, 0 when the stage does not touch it.
    pub fn rate_additive(&self, rate: &str) -> f64 {
        self.rate_additives.get(rate).copied().unwrap_or(0.0)
    }
}

/// RGBA blend color applied over the entity's sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Presentation changes requested by a stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisualOverlay {
    /// Higher wins. Falls back to the instance's stage number when unset.
    pub priority: Option<i32>,
    /// Appended to base sprite names (`"Hero"` + `"S2"`).
    pub suffix: Option<String>,
    pub character_name: Option<String>,
    pub character_index: Option<u8>,
    pub face_name: Option<String>,
    pub face_index: Option<u8>,
    pub battler_name: Option<String>,
    pub tint: Option<Tint>,
}

impl VisualOverlay {
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn tint(mut self, tint: Tint) -> Self {
        self.tint = Some(tint);
        self
    }
}

/// Specific item reference, as forbidden by a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemRef {
    Weapon(u32),
    Armor(u32),
}

/// Equipment and ability restrictions imposed while a stage is active.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StageRestrictions {
    pub forbidden_equip_types: Vec<EquipTypeId>,
    pub forbidden_items: Vec<ItemRef>,
    pub sealed_abilities: Vec<AbilityId>,
}

impl StageRestrictions {
    pub fn forbids(&self, candidate: &EquipCandidate) -> bool {
        self.forbidden_equip_types.contains(&candidate.equip_type)
            || self.forbidden_items.contains(&candidate.item)
    }

    pub fn seals(&self, ability: AbilityId) -> bool {
        self.sealed_abilities.contains(&ability)
    }

    pub fn is_empty(&self) -> bool {
        self.forbidden_equip_types.is_empty()
            && self.forbidden_items.is_empty()
            && self.sealed_abilities.is_empty()
    }
}

/// An item the host wants to equip, described by what restrictions inspect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EquipCandidate {
    pub item: ItemRef,
    pub equip_type: EquipTypeId,
}

/// Role (class) replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleChange {
    pub role: RoleId,
    /// Keep accumulated experience/progress across the change.
    #[cfg_attr(feature = "serde", serde(default = "keep_progress_default"))]
    pub keep_progress: bool,
}

#[cfg(feature = "serde")]
fn keep_progress_default() -> bool {
    true
}

/// Replacement of a friendly entity by a hostile one inside an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostileConversion {
    pub template: TemplateId,
    /// Carry the original's display name over to the spawned hostile.
    #[cfg_attr(feature = "serde", serde(default))]
    pub keep_name: bool,
    /// Incapacitation tag for the original; the engine default when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub terminal_tag: Option<TagId>,
}

/// Identity-level side effects of entering a stage. All parts are optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransformAction {
    pub role_change: Option<RoleChange>,
    pub learn_abilities: Vec<AbilityId>,
    pub forget_abilities: Vec<AbilityId>,
    pub hostile_conversion: Option<HostileConversion>,
}

impl TransformAction {
    pub fn role(role: RoleId, keep_progress: bool) -> Self {
        Self {
            role_change: Some(RoleChange {
                role,
                keep_progress,
            }),
            ..Self::default()
        }
    }

    pub fn hostile(template: TemplateId, keep_name: bool) -> Self {
        Self {
            hostile_conversion: Some(HostileConversion {
                template,
                keep_name,
                terminal_tag: None,
            }),
            ..Self::default()
        }
    }

    pub fn with_hostile(mut self, template: TemplateId, keep_name: bool) -> Self {
        self.hostile_conversion = Some(HostileConversion {
            template,
            keep_name,
            terminal_tag: None,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.role_change.is_none()
            && self.learn_abilities.is_empty()
            && self.forget_abilities.is_empty()
            && self.hostile_conversion.is_none()
    }
}
