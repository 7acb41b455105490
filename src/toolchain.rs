//! Toolchain hash sourcing
//!
//! The toolchain is identified by the most recent commit touching the
//! `tools` and `toolchain` subtrees. The restore phase asks git directly;
//! the save phase reads the hash file an earlier build step wrote.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Resolves the latest commit touching a set of subtrees
#[async_trait]
pub trait CommitResolver: Send + Sync {
    /// Short hash of the newest commit under any of `paths`, relative to `root`
    async fn resolve_latest_commit(&self, root: &Path, paths: &[String]) -> CacheResult<String>;
}

/// Resolver backed by the `git` CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct GitResolver;

#[async_trait]
impl CommitResolver for GitResolver {
    async fn resolve_latest_commit(&self, root: &Path, paths: &[String]) -> CacheResult<String> {
        let mut args = vec![
            "log".to_string(),
            "--pretty=tformat:%h".to_string(),
            "-n1".to_string(),
            "--".to_string(),
        ];
        args.extend(paths.iter().cloned());
        debug!("Executing: git {:?} in {}", args, root.display());

        let output = Command::new("git")
            .args(&args)
            .current_dir(root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CacheError::command_failed("git log", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CacheError::HashResolution(format!(
                "git log failed in {}: {}",
                root.display(),
                stderr.trim()
            )));
        }

        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if hash.is_empty() {
            return Err(CacheError::HashResolution(format!(
                "no commits touch {} in {}",
                paths.join(", "),
                root.display()
            )));
        }

        Ok(hash)
    }
}

/// Resolver that always answers with the same hash
#[derive(Debug, Clone)]
pub struct StaticResolver(pub String);

#[async_trait]
impl CommitResolver for StaticResolver {
    async fn resolve_latest_commit(&self, _root: &Path, _paths: &[String]) -> CacheResult<String> {
        Ok(self.0.clone())
    }
}

/// Read the toolchain hash file. A missing, unreadable or empty file yields
/// `None` with a warning; the caller substitutes the sentinel.
pub async fn read_hash_file(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let hash = content.trim();
            if hash.is_empty() {
                warn!("{} is empty, using unknown toolchain hash", path.display());
                None
            } else {
                debug!("Read toolchain hash {} from {}", hash, path.display());
                Some(hash.to_string())
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} does not exist, using unknown toolchain hash", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read {}: {}, using unknown toolchain hash", path.display(), e);
            None
        }
    }
}
