//! Simulation settings read from the environment.
use std::env;
use std::path::PathBuf;

/// Where the simulation reads content from and how long it runs.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// RON catalog to load instead of the stock set.
    pub catalog_path: Option<PathBuf>,
    /// TOML engine configuration to load instead of the defaults.
    pub engine_config_path: Option<PathBuf>,
    /// Number of scheduler ticks to run.
    pub ticks: u64,
    /// Ticks advanced per scheduler step.
    pub tick_step: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            engine_config_path: None,
            ticks: 8,
            tick_step: 1800,
        }
    }
}

impl SimConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `AFFLICTION_CATALOG` - RON catalog path (default: stock set)
    /// - `AFFLICTION_CONFIG` - TOML engine config path (default: built-in defaults)
    /// - `AFFLICTION_TICKS` - Scheduler steps to run (default: 8)
    /// - `AFFLICTION_TICK_STEP` - Ticks per step (default: 1800)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.catalog_path = env::var_os("AFFLICTION_CATALOG").map(PathBuf::from);
        config.engine_config_path = env::var_os("AFFLICTION_CONFIG").map(PathBuf::from);

        if let Some(ticks) = read_env::<u64>("AFFLICTION_TICKS") {
            config.ticks = ticks;
        }
        if let Some(step) = read_env::<u64>("AFFLICTION_TICK_STEP") {
            config.tick_step = step.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
