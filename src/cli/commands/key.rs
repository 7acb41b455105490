//! Key command - print the key plan a phase would use

use super::{phase_context, PhasePaths};
use crate::cache;
use crate::cli::args::{KeyArgs, KeyPhase};
use crate::config::Config;
use crate::error::CacheResult;
use crate::toolchain;

/// Execute the key command
pub async fn execute(args: KeyArgs, config: Config, paths: PhasePaths) -> CacheResult<()> {
    let inputs = args.inputs();
    let ctx = phase_context(config, paths)?;
    let root = ctx.resolve_root(inputs.prefix.as_deref()).await?;

    let toolchain_hash = match (inputs.toolchain, args.phase) {
        (false, _) => None,
        (true, KeyPhase::Restore) => Some(
            ctx.resolver
                .resolve_latest_commit(&root, &ctx.config.toolchain.history_paths)
                .await?,
        ),
        (true, KeyPhase::Save) => {
            toolchain::read_hash_file(&root.join(&ctx.config.toolchain.hash_file)).await
        }
    };

    let plan = cache::build_key_plan(&inputs, toolchain_hash.as_deref(), &*ctx.clock);
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
