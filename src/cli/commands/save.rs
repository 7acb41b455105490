//! Save command - store built artifacts after the build

use super::{phase_context, PhasePaths};
use crate::cli::args::SaveArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::phase::{self, SaveOutcome};
use crate::ui::{self, UiContext};
use tracing::warn;

/// Execute the save command. Only fails if the phase could not be set up at all.
pub async fn execute(args: SaveArgs, config: Config, paths: PhasePaths) -> CacheResult<()> {
    let inputs = args.inputs();
    let ctx = match phase_context(config, paths) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!("Cache save not attempted: {}", e);
            return Ok(());
        }
    };
    let outcome = phase::save::run(&inputs, &ctx).await;

    let ui_ctx = UiContext::detect();
    ui::section(&ui_ctx, "Save");
    match outcome {
        SaveOutcome::Skipped(reason) => ui::step_info(&ui_ctx, &format!("Not saved: {}", reason)),
        SaveOutcome::Saved { key } => ui::step_ok(&ui_ctx, &format!("Saved {}", key)),
        SaveOutcome::Failed(reason) => ui::step_warn(&ui_ctx, &format!("Not saved: {}", reason)),
    }

    Ok(())
}
