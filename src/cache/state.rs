//! Cross-phase cache state
//!
//! The restore phase records a hit in a small JSON document at a path chosen
//! by the orchestrator; the save phase reads it back. The file only exists
//! after a hit, so an absent file means "no hit this run".

use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// State recorded by the restore phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Artifacts for this toolchain were restored; saving would be redundant
    Hit,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
        }
    }
}

/// Document handed from the restore phase to the save phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffState {
    pub state: CacheState,

    /// Key of the restored entry
    pub matched_key: String,

    /// Key the restore phase asked for
    pub primary_key: String,

    pub recorded_at: DateTime<Utc>,
}

impl HandoffState {
    /// Record a hit on `matched_key`
    pub fn hit(matched_key: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            state: CacheState::Hit,
            matched_key: matched_key.into(),
            primary_key: primary_key.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn is_hit(&self) -> bool {
        self.state == CacheState::Hit
    }
}

/// State file at a fixed location
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded state, `None` when nothing was recorded
    pub async fn load(&self) -> CacheResult<Option<HandoffState>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::StateRead {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::StateRead {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Read the recorded state and remove the file, so a state is consumed
    /// at most once
    pub async fn take(&self) -> CacheResult<Option<HandoffState>> {
        let state = self.load().await?;
        if state.is_some() {
            if let Err(e) = self.clear().await {
                warn!("{}", e);
            }
        }
        Ok(state)
    }

    /// Persist `state`, creating parent directories as needed
    pub async fn store(&self, state: &HandoffState) -> CacheResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| CacheError::io(format!("writing state file {}", self.path.display()), e))?;

        debug!("Recorded cache state {} in {}", state.state, self.path.display());
        Ok(())
    }

    /// Remove a state file left behind by an earlier run
    pub async fn clear(&self) -> CacheResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed stale state file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(
                format!("removing state file {}", self.path.display()),
                e,
            )),
        }
    }
}
