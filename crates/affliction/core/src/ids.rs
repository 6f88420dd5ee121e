//! Identifier and time types shared across the engine.
//!
//! Entities, tags, roles and abilities all belong to the host simulation; the
//! engine only stores their identifiers.

use std::borrow::Borrow;
use std::fmt;

/// Opaque handle to a host-owned simulation entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete simulation time unit. One tick is one host update step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` lies in the future.
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Registered effect type identifier (e.g. `"slime"`).
///
/// Ordering is lexical, which is what deterministic tie-breaks rely on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EffectTypeId(String);

impl EffectTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EffectTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectTypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EffectTypeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EffectTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

host_id!(
    /// Discrete state tag stored on an entity by the host.
    TagId
);
host_id!(
    /// Role (class) identifier understood by the host.
    RoleId
);
host_id!(
    /// Ability (skill) identifier understood by the host.
    AbilityId
);
host_id!(
    /// Hostile template used when spawning a converted entity.
    TemplateId
);
host_id!(
    /// Equipment slot type (weapon type, armor type, ...).
    EquipTypeId
);

/// Stage number within an effect type. Valid stages are `1..=max_stage`;
/// `0` means "not afflicted".
pub type Stage = u8;
