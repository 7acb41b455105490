//! Save phase
//!
//! Persists freshly built artifacts unless the restore phase recorded a hit
//! or the operator asked to skip saving. Nothing here fails the pipeline: a
//! missed cache write only costs the next run some time, so every error is
//! reported as a warning and folded into [`SaveOutcome::Failed`].

use crate::cache::{self, HandoffState};
use crate::config::Inputs;
use crate::error::CacheResult;
use crate::phase::PhaseContext;
use crate::toolchain;
use std::fmt;
use tracing::{error, info, warn};

/// Why nothing was saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The restore phase recorded a hit
    CacheHit,
    /// `skip_saving` was set
    Requested,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheHit => write!(f, "cache was restored this run"),
            Self::Requested => write!(f, "saving disabled by skip_saving"),
        }
    }
}

/// Result of a save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    Saved { key: String },
    Failed(String),
}

/// Run the save phase. Never fails.
pub async fn run(inputs: &Inputs, ctx: &PhaseContext) -> SaveOutcome {
    match save(inputs, ctx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_store_error() {
                error!("Cache save failed: {}", e);
            } else {
                warn!("{}", e);
            }
            SaveOutcome::Failed(e.to_string())
        }
    }
}

async fn save(inputs: &Inputs, ctx: &PhaseContext) -> CacheResult<SaveOutcome> {
    let state = ctx.state.take().await?;
    if state.as_ref().is_some_and(HandoffState::is_hit) {
        info!("Cache hit recorded, nothing to save");
        return Ok(SaveOutcome::Skipped(SkipReason::CacheHit));
    }
    if inputs.skip_saving {
        info!("skip_saving set, not saving cache");
        return Ok(SaveOutcome::Skipped(SkipReason::Requested));
    }

    let root = ctx.resolve_root(inputs.prefix.as_deref()).await?;

    let toolchain_hash = if inputs.toolchain {
        toolchain::read_hash_file(&root.join(&ctx.config.toolchain.hash_file)).await
    } else {
        None
    };

    let plan = cache::build_key_plan(inputs, toolchain_hash.as_deref(), &*ctx.clock);
    info!("Cache key: {}", plan.primary);
    info!("Cache paths: [{}]", plan.paths.join(", "));

    ctx.store.save(&root, &plan.paths, &plan.primary).await?;
    info!("{} cache saved", plan.primary);

    Ok(SaveOutcome::Saved { key: plan.primary })
}
