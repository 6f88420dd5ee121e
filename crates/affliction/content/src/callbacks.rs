//! Lifecycle callbacks that narrate affliction changes through `tracing`.

use affliction_core::{CallbackContext, EffectCallbacks, Stage};
use tracing::info;

/// Logs every lifecycle transition of the type it is attached to, using the
/// host's display name for the entity.
#[derive(Clone, Debug, Default)]
pub struct LoggingCallbacks {
    display_name: String,
}

impl LoggingCallbacks {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    fn who(ctx: &CallbackContext<'_>) -> String {
        ctx.host
            .name(ctx.entity)
            .unwrap_or_else(|| ctx.entity.to_string())
    }
}

impl EffectCallbacks for LoggingCallbacks {
    fn on_apply(&self, ctx: &mut CallbackContext<'_>, stage: Stage) {
        info!(
            entity = %ctx.entity,
            type_id = %ctx.type_id,
            stage,
            "{} contracted {}",
            Self::who(ctx),
            self.display_name
        );
    }

    fn on_advance(&self, ctx: &mut CallbackContext<'_>, from: Stage, to: Stage) {
        let verb = if to > from { "worsened" } else { "eased" };
        info!(
            entity = %ctx.entity,
            type_id = %ctx.type_id,
            from,
            to,
            "{}'s {} {verb}",
            Self::who(ctx),
            self.display_name
        );
    }

    fn on_remove(&self, ctx: &mut CallbackContext<'_>) {
        info!(
            entity = %ctx.entity,
            type_id = %ctx.type_id,
            "{} was cured of {}",
            Self::who(ctx),
            self.display_name
        );
    }

    fn on_max_stage(&self, ctx: &mut CallbackContext<'_>) {
        info!(
            entity = %ctx.entity,
            type_id = %ctx.type_id,
            "{} fully succumbed to {}",
            Self::who(ctx),
            self.display_name
        );
    }
}
