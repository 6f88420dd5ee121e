//! The stock affliction set shipped with the crate.

use affliction_core::{EffectCatalog, EffectTypeDefinition};

use crate::loaders::{CatalogLoader, LoadResult};

const AFFLICTIONS_RON: &str = include_str!("../data/afflictions.ron");

/// Definitions of the stock types: slime, hypnosis, parasite, drone, bound.
pub fn builtin_definitions() -> LoadResult<Vec<EffectTypeDefinition>> {
    CatalogLoader::parse_definitions(AFFLICTIONS_RON)
}

/// Catalog of the stock types with logging callbacks and built-in handlers.
pub fn builtin_catalog() -> LoadResult<EffectCatalog> {
    CatalogLoader::build(builtin_definitions()?)
}
