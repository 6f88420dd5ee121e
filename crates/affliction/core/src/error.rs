//! Common error infrastructure for affliction-core.
//!
//! Engine operations never panic. Runtime faults (unknown types, missing
//! entities) are logged at the engine boundary and returned to the caller;
//! registration faults are fatal at boot and abort catalog construction.
//!
//! # Design Principles
//!
//! - **Type Safety**: Registration, runtime and command-parsing failures have
//!   separate error types
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **Developer Facing**: None of these are meant to be shown to players

use crate::ids::{EffectTypeId, EntityId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// A precondition was not met; the compatible part of the request still ran.
    ///
    /// Examples: hostile conversion requested outside an encounter
    Recoverable,

    /// Invalid input, the call was a no-op.
    ///
    /// Examples: unknown effect type, entity unknown to the host
    Validation,

    /// Startup configuration is broken and initialization must abort.
    ///
    /// Examples: duplicate type id, tag/stage count mismatch
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if initialization must stop.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Common trait for all affliction-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

/// Runtime failures of apply/advance/remove and friends.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AfflictionError {
    #[error("unknown effect type `{0}`")]
    UnknownEffectType(EffectTypeId),

    #[error("entity {0} is not known to the host")]
    MissingEntity(EntityId),

    #[error("hostile conversion of {0} skipped: no active encounter")]
    ConversionUnavailable(EntityId),

    #[error("no effect handler registered under `{0}`")]
    UnknownHandler(String),

    #[error("effect handler `{handler}` needs argument `{argument}`")]
    MissingHandlerArgument {
        handler: &'static str,
        argument: &'static str,
    },
}

impl EngineError for AfflictionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConversionUnavailable(_) => ErrorSeverity::Recoverable,
            Self::UnknownEffectType(_)
            | Self::MissingEntity(_)
            | Self::UnknownHandler(_)
            | Self::MissingHandlerArgument { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEffectType(_) => "UNKNOWN_EFFECT_TYPE",
            Self::MissingEntity(_) => "MISSING_ENTITY",
            Self::ConversionUnavailable(_) => "TRANSFORM_PRECONDITION_UNMET",
            Self::UnknownHandler(_) => "UNKNOWN_HANDLER",
            Self::MissingHandlerArgument { .. } => "MISSING_HANDLER_ARGUMENT",
        }
    }
}

/// Registration conflicts. Always fatal: the catalog is not built.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("effect type `{0}` registered twice")]
    DuplicateType(EffectTypeId),

    #[error("effect type `{0}` declares max_stage 0")]
    ZeroMaxStage(EffectTypeId),

    #[error("effect type `{id}` declares {max_stage} stages but configures {stages}")]
    StageCountMismatch {
        id: EffectTypeId,
        max_stage: u8,
        stages: usize,
    },

    #[error("effect type `{id}` declares {max_stage} stages but links {tags} tags")]
    TagCountMismatch {
        id: EffectTypeId,
        max_stage: u8,
        tags: usize,
    },

    #[error("effect type `{id}` stage {stage} has stumble chance {chance} outside [0, 1]")]
    InvalidStumbleChance {
        id: EffectTypeId,
        stage: u8,
        chance: f64,
    },

    #[error("effect type `{0}` configures a zero-tick progression interval")]
    ZeroInterval(EffectTypeId),

    #[error("callbacks attached to unregistered effect type `{0}`")]
    CallbacksForUnknownType(EffectTypeId),

    #[error("effect handler `{0}` registered twice")]
    DuplicateHandler(String),
}

impl EngineError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateType(_) => "DUPLICATE_TYPE",
            Self::ZeroMaxStage(_) => "ZERO_MAX_STAGE",
            Self::StageCountMismatch { .. } => "STAGE_COUNT_MISMATCH",
            Self::TagCountMismatch { .. } => "TAG_COUNT_MISMATCH",
            Self::InvalidStumbleChance { .. } => "INVALID_STUMBLE_CHANCE",
            Self::ZeroInterval(_) => "ZERO_INTERVAL",
            Self::CallbacksForUnknownType(_) => "CALLBACKS_FOR_UNKNOWN_TYPE",
            Self::DuplicateHandler(_) => "DUPLICATE_HANDLER",
        }
    }
}
