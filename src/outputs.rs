//! Step outputs for the CI runner
//!
//! Appends `name=value` lines to the file named by `$GITHUB_OUTPUT`, where
//! later workflow steps can branch on them. Outside a runner this is a no-op.
//! Write failures are logged and dropped; an output must never fail a phase.

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Environment variable naming the runner's output file
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Sink for step outputs
#[derive(Debug, Clone, Default)]
pub struct ActionOutputs {
    path: Option<PathBuf>,
}

impl ActionOutputs {
    /// Use `$GITHUB_OUTPUT` when set
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(GITHUB_OUTPUT)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Write outputs to `path`
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Publish one output
    pub async fn set(&self, name: &str, value: &str) {
        info!("Output {}={}", name, value);

        let Some(path) = &self.path else {
            return;
        };

        let line = format!("{name}={}\n", value.replace(['\r', '\n'], " "));
        if let Err(e) = Self::append(path, &line).await {
            warn!("Failed to write output {} to {}: {}", name, path.display(), e);
        }
    }

    async fn append(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
