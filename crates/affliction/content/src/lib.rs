//! Data-driven affliction content and loaders.
//!
//! This crate houses the stock affliction set and loaders for data files:
//! - Effect type catalogs (data-driven via RON)
//! - Engine configuration (data-driven via TOML)
//! - Logging lifecycle callbacks for hosts without their own
//!
//! Definitions deserialize straight into affliction-core types; code-only
//! parts (callbacks, handlers) are attached while building the catalog.

pub mod callbacks;

#[cfg(feature = "loaders")]
pub mod builtin;
#[cfg(feature = "loaders")]
pub mod loaders;

pub use callbacks::LoggingCallbacks;

#[cfg(feature = "loaders")]
pub use builtin::{builtin_catalog, builtin_definitions};
#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, EffectCatalogFile, LoadResult};
