//! Effect type definitions.

use super::callbacks::{CallbackHandle, EffectCallbacks};
use super::stage::StageConfig;
use crate::error::CatalogError;
use crate::ids::{EffectTypeId, Stage, TagId};

/// Immutable definition of one effect type, registered once at boot.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTypeDefinition {
    pub id: EffectTypeId,

    /// Display name. Defaults to the id when empty.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,

    pub max_stage: Stage,

    /// One entry per stage, stage 1 first.
    pub stages: Vec<StageConfig>,

    /// Linked state tags, one per stage. `None` entries link nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Option<Vec<Option<TagId>>>,

    /// Default ticks between automatic advancements.
    #[cfg_attr(feature = "serde", serde(default))]
    pub progression_interval: Option<u64>,

    /// Short key used by sprite-name formats (`"S"` for slime).
    #[cfg_attr(feature = "serde", serde(default))]
    pub sprite_key: Option<String>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub callbacks: Option<CallbackHandle>,
}

impl EffectTypeDefinition {
    /// Creates a definition whose `max_stage` is the number of stages given.
    pub fn new(id: impl Into<EffectTypeId>, name: impl Into<String>, stages: Vec<StageConfig>) -> Self {
        let max_stage = Stage::try_from(stages.len()).unwrap_or(Stage::MAX);
        Self {
            id: id.into(),
            name: name.into(),
            max_stage,
            stages,
            tags: None,
            progression_interval: None,
            sprite_key: None,
            callbacks: None,
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tags = Some(tags.into_iter().map(Some).collect());
        self
    }

    pub fn with_interval(mut self, ticks: u64) -> Self {
        self.progression_interval = Some(ticks);
        self
    }

    pub fn with_sprite_key(mut self, key: impl Into<String>) -> Self {
        self.sprite_key = Some(key.into());
        self
    }

    pub fn with_callbacks(mut self, callbacks: impl EffectCallbacks + 'static) -> Self {
        self.callbacks = Some(CallbackHandle::new(callbacks));
        self
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Saturating clamp of a requested stage into `1..=max_stage`.
    pub fn clamp_stage(&self, requested: i32) -> Stage {
        let clamped = requested.clamp(1, i32::from(self.max_stage));
        Stage::try_from(clamped).unwrap_or(self.max_stage)
    }

    /// Configuration of `stage` (1-based).
    pub fn stage(&self, stage: Stage) -> Option<&StageConfig> {
        usize::from(stage)
            .checked_sub(1)
            .and_then(|index| self.stages.get(index))
    }

    /// Tag linked to `stage`, if any. Tag `0` links nothing.
    pub fn tag_for(&self, stage: Stage) -> Option<TagId> {
        let index = usize::from(stage).checked_sub(1)?;
        self.tags
            .as_ref()?
            .get(index)
            .copied()
            .flatten()
            .filter(|tag| tag.0 != 0)
    }

    /// Every tag linked to any stage of this type.
    pub fn linked_tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags
            .iter()
            .flatten()
            .filter_map(|tag| *tag)
            .filter(|tag| tag.0 != 0)
    }

    /// Progression interval at `stage`: the stage override, else the default.
    pub fn interval_at(&self, stage: Stage) -> Option<u64> {
        self.stage(stage)
            .and_then(|config| config.progression_interval)
            .or(self.progression_interval)
    }

    pub fn is_max(&self, stage: Stage) -> bool {
        stage >= self.max_stage
    }

    /// Registration-time validation of the whole schema.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.max_stage == 0 {
            return Err(CatalogError::ZeroMaxStage(self.id.clone()));
        }
        if self.stages.len() != usize::from(self.max_stage) {
            return Err(CatalogError::StageCountMismatch {
                id: self.id.clone(),
                max_stage: self.max_stage,
                stages: self.stages.len(),
            });
        }
        if let Some(tags) = &self.tags
            && tags.len() != usize::from(self.max_stage)
        {
            return Err(CatalogError::TagCountMismatch {
                id: self.id.clone(),
                max_stage: self.max_stage,
                tags: tags.len(),
            });
        }
        if self.progression_interval == Some(0)
            || self.stages.iter().any(|s| s.progression_interval == Some(0))
        {
            return Err(CatalogError::ZeroInterval(self.id.clone()));
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if !(0.0..=1.0).contains(&stage.stumble_chance) {
                return Err(CatalogError::InvalidStumbleChance {
                    id: self.id.clone(),
                    stage: Stage::try_from(index + 1).unwrap_or(Stage::MAX),
                    chance: stage.stumble_chance,
                });
            }
        }
        Ok(())
    }
}
