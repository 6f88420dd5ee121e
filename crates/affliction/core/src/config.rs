use crate::ids::TagId;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Initial state of the time progression scheduler.
    pub time_progression_enabled: bool,

    /// Incapacitation tag applied to an entity converted into a hostile, and
    /// to an entity depleted by a drain handler, unless a stage names its own.
    pub terminal_tag: TagId,

    /// Per-member roll (percent) used by the contagion handler once the
    /// outer spread roll has succeeded.
    pub contagion_chance_percent: u32,

    /// Base seed mixed into every random roll the engine performs.
    pub rng_seed: u64,
}

impl EngineConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TERMINAL_TAG: TagId = TagId(1);
    pub const DEFAULT_CONTAGION_CHANCE_PERCENT: u32 = 30;

    pub fn new() -> Self {
        Self {
            time_progression_enabled: true,
            terminal_tag: Self::DEFAULT_TERMINAL_TAG,
            contagion_chance_percent: Self::DEFAULT_CONTAGION_CHANCE_PERCENT,
            rng_seed: 0,
        }
    }

    pub fn with_terminal_tag(mut self, terminal_tag: TagId) -> Self {
        self.terminal_tag = terminal_tag;
        self
    }

    pub fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    pub fn with_time_progression(mut self, enabled: bool) -> Self {
        self.time_progression_enabled = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
