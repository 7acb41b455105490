//! Restore phase
//!
//! Builds the key plan from the live git history, asks the store for a
//! match and records a hit for the save phase. On a hit that carries a
//! toolchain built from the current sources, the top-level Makefile is
//! patched so the build skips compiling tools and toolchain again.
//!
//! Every error here is fatal: continuing without a cache decision risks an
//! inconsistent partial build.

use crate::cache::{self, HandoffState};
use crate::config::Inputs;
use crate::error::CacheResult;
use crate::makefile::{self, RuleEdit};
use crate::phase::PhaseContext;
use tracing::{debug, info, warn};

/// Result of a restore attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// `clean` was requested; the store was not consulted
    Skipped,
    /// Nothing matched
    Miss,
    /// Restored an entry built from the same toolchain sources
    Hit { key: String, patched: bool },
    /// Restored an entry whose toolchain hash differs. The toolchain must be
    /// rebuilt, so no hit is recorded and the Makefile is left alone.
    Partial { key: String },
}

impl RestoreOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// Run the restore phase
pub async fn run(inputs: &Inputs, ctx: &PhaseContext) -> CacheResult<RestoreOutcome> {
    // A hit left by an earlier run must not suppress this run's save
    ctx.state.clear().await?;

    if inputs.clean {
        info!("Clean build requested, not restoring cache");
        return Ok(RestoreOutcome::Skipped);
    }

    let root = ctx.resolve_root(inputs.prefix.as_deref()).await?;

    let toolchain_hash = if inputs.toolchain {
        let hash = ctx
            .resolver
            .resolve_latest_commit(&root, &ctx.config.toolchain.history_paths)
            .await?;
        debug!("Toolchain hash from history: {}", hash);
        Some(hash)
    } else {
        debug!("Skipping toolchain processing");
        None
    };

    let plan = cache::build_key_plan(inputs, toolchain_hash.as_deref(), &*ctx.clock);
    info!("Cache key: {}", plan.primary);
    info!("Restore keys: [{}]", plan.fallbacks.join(", "));
    info!("Cache paths: [{}]", plan.paths.join(", "));

    let matched = ctx
        .store
        .restore(&root, &plan.paths, &plan.primary, &plan.fallbacks)
        .await?;

    let Some(key) = matched else {
        info!("No cache entry matched");
        ctx.outputs.set("hit", "0").await;
        return Ok(RestoreOutcome::Miss);
    };

    ctx.outputs.set("key", &key).await;

    if inputs.toolchain && !plan.covers_toolchain(&key) {
        warn!(
            "Restored {} from a different toolchain; toolchain will be rebuilt",
            key
        );
        ctx.outputs.set("hit", "0").await;
        return Ok(RestoreOutcome::Partial { key });
    }

    info!("{} cache fetched!", key);
    ctx.state.store(&HandoffState::hit(&key, &plan.primary)).await?;
    ctx.outputs.set("hit", "1").await;

    let mut patched = false;
    if inputs.toolchain && inputs.skip_toolchain_build {
        let path = root.join(&ctx.config.build.makefile);
        match makefile::patch_file(&path, &RuleEdit::skip_toolchain()).await {
            Ok(0) => {}
            Ok(_) => {
                patched = true;
                info!("Toolchain building skipped");
            }
            Err(e) => warn!("Could not skip toolchain build: {}", e),
        }
    }

    Ok(RestoreOutcome::Hit { key, patched })
}
