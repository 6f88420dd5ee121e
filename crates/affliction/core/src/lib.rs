//! Layered, staged status-effect progression.
//!
//! `affliction-core` tracks, per host entity, several independently staged
//! afflictions at once, combines their modifiers into one deterministic
//! outcome, advances them over time, and fires identity-level transforms
//! (role change, hostile conversion) exactly once per stage entry.
//!
//! Entities belong to the host; the engine reaches them only through
//! [`host::EntityHost`]. All state mutation flows through
//! [`manager::EffectManager`], usually via the [`engine::AfflictionEngine`]
//! façade, and supporting crates depend on the types re-exported here.
pub mod aggregate;
pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod host;
pub mod ids;
pub mod manager;
pub mod rng;
pub mod schedule;
pub mod store;
pub mod transform;

pub use aggregate::{ActiveOverlay, ModifierAggregator, SpriteKind};
pub use catalog::{
    BehaviorOverride, CallbackContext, CallbackHandle, CatalogBuilder, EffectCallbacks,
    EffectCatalog, EffectTypeDefinition, EquipCandidate, HostileConversion, ItemRef, RoleChange,
    StageConfig, StageRestrictions, Tint, TransformAction, VisualOverlay,
};
pub use command::{Command, CommandError, NoteTag, NoteTrigger};
pub use config::EngineConfig;
pub use engine::{ActiveAffliction, AfflictionEngine, CommandOutcome, RegisteredType};
pub use error::{AfflictionError, CatalogError, EngineError, ErrorSeverity};
pub use events::{AfflictionEvent, RefreshFlags};
pub use handlers::{Contagion, Drain, EffectHandler, HandlerArgs, HandlerContext, HandlerOutcome};
pub use host::{EntityHost, MemoryHost, RoleLearning};
pub use ids::{AbilityId, EffectTypeId, EntityId, EquipTypeId, RoleId, Stage, TagId, TemplateId, Tick};
pub use manager::{ApplyOutcome, EffectManager, StageChange};
pub use rng::{PcgRng, RngOracle};
pub use schedule::{Progression, TimeProgression};
pub use store::{EffectInstance, EntityAfflictions};
pub use transform::TransformReport;
