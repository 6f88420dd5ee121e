//! Effect catalog loader.

use std::path::Path;

use affliction_core::{CallbackHandle, EffectCatalog, EffectTypeDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::callbacks::LoggingCallbacks;
use crate::loaders::{LoadResult, read_file};

/// Loader for effect type catalogs from RON files.
pub struct CatalogLoader;

/// On-disk shape of a catalog file.
#[derive(Debug, Serialize, Deserialize)]
pub struct EffectCatalogFile {
    pub types: Vec<EffectTypeDefinition>,
}

impl CatalogLoader {
    /// Load definitions from a RON file without building a catalog.
    pub fn load_definitions(path: &Path) -> LoadResult<Vec<EffectTypeDefinition>> {
        let content = read_file(path)?;
        Self::parse_definitions(&content)
    }

    pub fn parse_definitions(content: &str) -> LoadResult<Vec<EffectTypeDefinition>> {
        let file: EffectCatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog RON: {}", e))?;

        Ok(file.types)
    }

    /// Load and validate a catalog from a RON file.
    ///
    /// Every type gets [`LoggingCallbacks`] and the catalog carries the
    /// built-in handlers.
    pub fn load(path: &Path) -> LoadResult<EffectCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid catalog {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<EffectCatalog> {
        let definitions = Self::parse_definitions(content)?;
        Self::build(definitions)
    }

    pub(crate) fn build(definitions: Vec<EffectTypeDefinition>) -> LoadResult<EffectCatalog> {
        let mut builder = EffectCatalog::builder();
        for definition in definitions {
            let id = definition.id.clone();
            let callbacks = LoggingCallbacks::new(definition.display_name());
            builder.register(definition)?;
            builder.attach_callbacks(id.as_str(), CallbackHandle::new(callbacks))?;
        }
        builder.with_builtin_handlers()?;

        let catalog = builder.build();
        debug!(types = catalog.len(), "effect catalog built");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use affliction_core::{BehaviorOverride, TagId};

    use super::*;

    const SMALL: &str = r#"
#![enable(implicit_some)]
(
    types: [
        (
            id: "bound",
            name: "Bound",
            max_stage: 2,
            tags: [30, 31],
            stages: [
                (stat_multipliers: {"agi": 0.7}, movement_delta: -2),
                (stat_multipliers: {"agi": 0.4}, movement_delta: -4, behavior: CannotAct),
            ],
        ),
    ],
)
"#;

    #[test]
    fn parses_a_minimal_catalog() {
        let catalog = CatalogLoader::parse(SMALL).unwrap();
        let bound = catalog.get("bound").unwrap();

        assert_eq!(bound.max_stage, 2);
        assert_eq!(bound.tag_for(2), Some(TagId(31)));
        assert_eq!(bound.stage(2).unwrap().behavior, BehaviorOverride::CannotAct);
        assert!(bound.callbacks.is_some());
        assert!(catalog.handler("drain").is_some());
        assert!(catalog.handler("contagion").is_some());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL.as_bytes()).unwrap();

        let catalog = CatalogLoader::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn stage_count_mismatch_is_rejected() {
        let broken = SMALL.replace("max_stage: 2", "max_stage: 3");
        let err = CatalogLoader::parse(&broken).unwrap_err();
        assert!(err.to_string().contains("declares 3 stages"));
    }

    #[test]
    fn malformed_ron_reports_parse_failure() {
        let err = CatalogLoader::parse("(types: [ (id: ").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse effect catalog RON"));
    }
}
