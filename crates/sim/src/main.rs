//! Affliction simulation binary.
//!
//! Composition root: loads content, builds the engine against an in-memory
//! host and plays a short scripted scenario, printing each entity's
//! afflictions and aggregated modifiers.
//!
//! ```bash
//! RUST_LOG=affliction_core=debug cargo run -p affliction-sim
//! AFFLICTION_CATALOG=my_types.ron AFFLICTION_TICKS=20 cargo run -p affliction-sim
//! ```

mod config;
mod scenario;

use std::sync::Arc;

use affliction_content::{CatalogLoader, ConfigLoader, builtin_catalog};
use affliction_core::{AfflictionEngine, EngineConfig};
use anyhow::Result;

use crate::config::SimConfig;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let sim = SimConfig::from_env();

    // 1. Content
    let catalog = match &sim.catalog_path {
        Some(path) => CatalogLoader::load(path)?,
        None => builtin_catalog()?,
    };
    let engine_config = match &sim.engine_config_path {
        Some(path) => ConfigLoader::load(path)?,
        None => EngineConfig::default(),
    };
    tracing::info!(types = catalog.len(), "catalog loaded");

    // 2. Engine
    let engine = AfflictionEngine::new(Arc::new(catalog), engine_config);

    // 3. Scenario
    scenario::run(engine, &sim)
}
