//! CLI command implementations

pub mod config;
pub mod key;
pub mod restore;
pub mod save;

pub use config::execute as config;
pub use key::execute as key;
pub use restore::execute as restore;
pub use save::execute as save;

use crate::cache::{LocalStore, StateFile, SystemClock};
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use crate::outputs::ActionOutputs;
use crate::phase::PhaseContext;
use crate::toolchain::GitResolver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Locations given on the command line, overriding config and defaults
#[derive(Debug, Clone, Default)]
pub struct PhasePaths {
    pub state_file: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

/// Wire the production collaborators for a phase
pub fn phase_context(config: Config, paths: PhasePaths) -> CacheResult<PhaseContext> {
    let workdir =
        std::env::current_dir().map_err(|e| CacheError::io("getting current directory", e))?;

    let store_dir = paths
        .store
        .or_else(|| config.store.path.clone())
        .unwrap_or_else(ConfigManager::default_store_dir);
    let state_path = paths
        .state_file
        .unwrap_or_else(ConfigManager::default_state_path);
    debug!("Store: {}", store_dir.display());
    debug!("State file: {}", state_path.display());

    Ok(PhaseContext {
        store: Arc::new(LocalStore::new(store_dir)),
        resolver: Arc::new(GitResolver),
        clock: Arc::new(SystemClock),
        outputs: ActionOutputs::from_env(),
        state: StateFile::new(state_path),
        config,
        workdir,
    })
}
