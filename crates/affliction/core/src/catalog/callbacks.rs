//! Lifecycle callbacks attached to effect types.

use std::fmt;
use std::sync::Arc;

use crate::host::EntityHost;
use crate::ids::{EffectTypeId, EntityId, Stage, Tick};

/// What a lifecycle callback may see and touch.
pub struct CallbackContext<'a> {
    pub host: &'a mut dyn EntityHost,
    pub entity: EntityId,
    pub type_id: &'a EffectTypeId,
    pub now: Tick,
}

/// Optional lifecycle capability of an effect type.
///
/// Every method defaults to doing nothing; implement only the transitions a
/// type cares about. Callbacks run synchronously inside the manager call that
/// caused them, after linked tags are synced and before the stage transform.
pub trait EffectCallbacks: Send + Sync {
    /// First activation of the type on the entity.
    fn on_apply(&self, _ctx: &mut CallbackContext<'_>, _stage: Stage) {}

    /// Stage change of an existing instance.
    fn on_advance(&self, _ctx: &mut CallbackContext<'_>, _from: Stage, _to: Stage) {}

    /// Removal of an existing instance.
    fn on_remove(&self, _ctx: &mut CallbackContext<'_>) {}

    /// The entity entered the terminal stage.
    fn on_max_stage(&self, _ctx: &mut CallbackContext<'_>) {}
}

/// Shared handle to a type's callbacks.
#[derive(Clone)]
pub struct CallbackHandle(Arc<dyn EffectCallbacks>);

impl CallbackHandle {
    pub fn new(callbacks: impl EffectCallbacks + 'static) -> Self {
        Self(Arc::new(callbacks))
    }

    pub fn from_arc(callbacks: Arc<dyn EffectCallbacks>) -> Self {
        Self(callbacks)
    }

    pub fn get(&self) -> &dyn EffectCallbacks {
        self.0.as_ref()
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackHandle(..)")
    }
}
