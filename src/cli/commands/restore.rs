//! Restore command - fetch cached artifacts before the build

use super::{phase_context, PhasePaths};
use crate::cli::args::RestoreArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::phase::{self, RestoreOutcome};
use crate::ui::{self, UiContext};

/// Execute the restore command
pub async fn execute(args: RestoreArgs, config: Config, paths: PhasePaths) -> CacheResult<()> {
    let inputs = args.inputs();
    let ctx = phase_context(config, paths)?;
    let outcome = phase::restore::run(&inputs, &ctx).await?;

    let ui_ctx = UiContext::detect();
    ui::section(&ui_ctx, "Restore");
    ui::key_value(&ui_ctx, "store", ctx.store.store_name());
    match outcome {
        RestoreOutcome::Skipped => ui::step_info(&ui_ctx, "Clean build, cache not restored"),
        RestoreOutcome::Miss => ui::step_warn(&ui_ctx, "No cache entry found"),
        RestoreOutcome::Partial { key } => {
            ui::step_warn(&ui_ctx, &format!("Restored {} (toolchain will be rebuilt)", key))
        }
        RestoreOutcome::Hit { key, patched } => {
            ui::step_ok(&ui_ctx, &format!("Restored {}", key));
            if patched {
                ui::step_ok(&ui_ctx, "Toolchain build skipped");
            }
        }
    }

    Ok(())
}
