//! Custom effect handlers.
//!
//! Handlers cover effects that do not fit the staged model: periodic health
//! drain, spreading an affliction across a party. They are registered in the
//! catalog under a string key and only ever run when a caller invokes them
//! explicitly; the manager and scheduler never do.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::AfflictionError;
use crate::host::EntityHost;
use crate::ids::{EffectTypeId, EntityId, Tick};
use crate::manager::EffectManager;
use crate::rng::{RngOracle, RollContext, compute_seed};

/// Everything a handler may read or mutate.
pub struct HandlerContext<'a> {
    pub manager: &'a mut EffectManager,
    pub host: &'a mut dyn EntityHost,
    pub rng: &'a dyn RngOracle,
    pub config: &'a EngineConfig,
    /// Entity the effect originates from.
    pub source: EntityId,
    pub now: Tick,
}

/// Loosely typed handler arguments. Each handler documents what it reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandlerArgs {
    pub type_id: Option<EffectTypeId>,
    pub amount: Option<i32>,
    pub chance: Option<f64>,
}

impl HandlerArgs {
    pub fn amount(amount: i32) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn spread(type_id: impl Into<EffectTypeId>, chance: f64) -> Self {
        Self {
            type_id: Some(type_id.into()),
            chance: Some(chance),
            ..Self::default()
        }
    }
}

/// What a handler did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Entities whose state the handler changed.
    pub affected: Vec<EntityId>,
}

pub trait EffectHandler: Send + Sync {
    fn invoke(
        &self,
        ctx: &mut HandlerContext<'_>,
        args: &HandlerArgs,
    ) -> Result<HandlerOutcome, AfflictionError>;
}

/// Drains `amount` health from the source. A depleted source receives the
/// configured terminal tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct Drain;

impl Drain {
    pub const KEY: &'static str = "drain";
}

impl EffectHandler for Drain {
    fn invoke(
        &self,
        ctx: &mut HandlerContext<'_>,
        args: &HandlerArgs,
    ) -> Result<HandlerOutcome, AfflictionError> {
        let amount = args.amount.ok_or(AfflictionError::MissingHandlerArgument {
            handler: Self::KEY,
            argument: "amount",
        })?;
        if !ctx.host.contains(ctx.source) {
            return Err(AfflictionError::MissingEntity(ctx.source));
        }

        let mut outcome = HandlerOutcome::default();
        if ctx.host.drain(ctx.source, amount) {
            let tag = ctx.config.terminal_tag;
            ctx.host.add_tag(ctx.source, tag);
            info!(entity = %ctx.source, %tag, "drained to depletion");
            outcome.affected.push(ctx.source);
        }
        Ok(outcome)
    }
}

/// Spreads `type_id` from the source to the rest of its party.
///
/// Rolls `chance` (default 1) once for the source; on success every other
/// member not yet afflicted by the type rolls `contagion_chance_percent` and
/// receives stage 1 on a hit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Contagion;

impl Contagion {
    pub const KEY: &'static str = "contagion";
}

impl EffectHandler for Contagion {
    fn invoke(
        &self,
        ctx: &mut HandlerContext<'_>,
        args: &HandlerArgs,
    ) -> Result<HandlerOutcome, AfflictionError> {
        let type_id = args
            .type_id
            .as_ref()
            .ok_or(AfflictionError::MissingHandlerArgument {
                handler: Self::KEY,
                argument: "type_id",
            })?;
        if !ctx.manager.catalog().contains(type_id.as_str()) {
            return Err(AfflictionError::UnknownEffectType(type_id.clone()));
        }

        let mut outcome = HandlerOutcome::default();
        let seed = ctx.config.rng_seed;
        let spread_seed = compute_seed(seed, ctx.now.0, ctx.source.0, RollContext::ContagionSpread, 0);
        if !ctx.rng.chance(spread_seed, args.chance.unwrap_or(1.0)) {
            debug!(source = %ctx.source, %type_id, "contagion did not spread");
            return Ok(outcome);
        }

        for member in ctx.host.party_members(ctx.source) {
            if member == ctx.source || ctx.manager.is_active(member, type_id.as_str()) {
                continue;
            }
            let member_seed = compute_seed(seed, ctx.now.0, member.0, RollContext::ContagionMember, 0);
            if ctx.rng.roll_d100(member_seed) > ctx.config.contagion_chance_percent {
                continue;
            }
            ctx.manager
                .apply(&mut *ctx.host, member, type_id.as_str(), 1, ctx.now)?;
            debug!(source = %ctx.source, %member, %type_id, "contagion spread");
            outcome.affected.push(member);
        }
        Ok(outcome)
    }
}
