//! Restore and save phases
//!
//! Both phases are functions of explicit inputs plus a [`PhaseContext`]
//! holding their collaborators. The restore phase runs early in the build
//! pipeline and may record a hit; the save phase runs late and only stores
//! artifacts the run actually rebuilt.

pub mod restore;
pub mod save;

#[cfg(test)]
pub(crate) mod testing;

pub use restore::RestoreOutcome;
pub use save::{SaveOutcome, SkipReason};

use crate::cache::{BlobStore, Clock, StateFile};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::outputs::ActionOutputs;
use crate::toolchain::CommitResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Collaborators and settings shared by both phases
pub struct PhaseContext {
    pub store: Arc<dyn BlobStore>,
    pub resolver: Arc<dyn CommitResolver>,
    pub clock: Arc<dyn Clock>,
    pub outputs: ActionOutputs,
    pub state: StateFile,
    pub config: Config,
    /// Directory `prefix` is resolved against
    pub workdir: PathBuf,
}

impl PhaseContext {
    /// Resolve the build root: `workdir` joined with `prefix`.
    ///
    /// All relative cache paths, the hash file and the Makefile are taken
    /// relative to the returned directory; the process working directory is
    /// left alone.
    pub async fn resolve_root(&self, prefix: Option<&Path>) -> CacheResult<PathBuf> {
        let candidate = match prefix {
            Some(prefix) => self.workdir.join(prefix),
            None => self.workdir.clone(),
        };

        let root = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|e| CacheError::PrefixNotFound {
                path: candidate.clone(),
                reason: e.to_string(),
            })?;

        if !root.is_dir() {
            return Err(CacheError::PrefixNotFound {
                path: candidate,
                reason: "not a directory".to_string(),
            });
        }

        info!("Working directory: {}", root.display());
        Ok(root)
    }
}
