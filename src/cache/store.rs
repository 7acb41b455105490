//! Blob store abstraction
//!
//! Restore and save are the only two operations the phases need. The
//! bundled [`LocalStore`] keeps gzip'd tarballs plus a JSON index in a
//! directory (a shared volume or a CI cache mount).

use crate::cache::archive;
use crate::cache::key::SEPARATOR;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the index file within the store directory
const INDEX_FILE: &str = "index.json";

/// Abstract artifact store
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Restore `paths` under `root` from the entry matching `primary`, or the
    /// first of `fallbacks` that matches. Returns the key of the restored
    /// entry, `None` on a miss.
    async fn restore(
        &self,
        root: &Path,
        paths: &[String],
        primary: &str,
        fallbacks: &[String],
    ) -> CacheResult<Option<String>>;

    /// Save `paths` under `root` as a new entry named `key`
    async fn save(&self, root: &Path, paths: &[String], key: &str) -> CacheResult<()>;

    /// Human-readable store name for display
    fn store_name(&self) -> &'static str;
}

/// Version stamp of a path set. Entries only match restores that use the
/// same path set, so a restore never extracts a partial artifact set.
pub fn paths_version(paths: &[String]) -> String {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(&hasher.finalize()[..8])
}

/// One saved archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub key: String,
    pub version: String,
    /// Archive file name within the store directory
    pub archive: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Entry listing persisted as `index.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreIndex {
    pub entries: Vec<StoreEntry>,
}

impl StoreIndex {
    /// Find the entry to restore.
    ///
    /// Keys are tried in order: `primary`, then each fallback. For each key
    /// an exact match wins, then the newest entry extending it by whole
    /// segments (`key-...`), then the newest entry merely starting with it.
    /// Only entries with `version` are considered.
    pub fn find_match(&self, version: &str, primary: &str, fallbacks: &[String]) -> Option<&StoreEntry> {
        let candidates: Vec<&StoreEntry> = self
            .entries
            .iter()
            .filter(|e| e.version == version)
            .collect();

        std::iter::once(primary)
            .chain(fallbacks.iter().map(String::as_str))
            .find_map(|key| {
                newest(&candidates, |k| k == key)
                    .or_else(|| {
                        newest(&candidates, |k| {
                            k.strip_prefix(key)
                                .is_some_and(|rest| rest.starts_with(SEPARATOR))
                        })
                    })
                    .or_else(|| newest(&candidates, |k| k.starts_with(key)))
            })
    }

    pub fn contains(&self, key: &str, version: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.key == key && e.version == version)
    }
}

fn newest<'a>(entries: &[&'a StoreEntry], pred: impl Fn(&str) -> bool) -> Option<&'a StoreEntry> {
    entries
        .iter()
        .copied()
        .filter(|e| pred(e.key.as_str()))
        .max_by_key(|e| e.created_at)
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Load the index; a missing index is an empty store
    pub async fn load_index(&self) -> CacheResult<StoreIndex> {
        let path = self.index_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreIndex::default()),
            Err(e) => return Err(CacheError::io(format!("reading {}", path.display()), e)),
        };

        serde_json::from_str(&content).map_err(|e| CacheError::IndexCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    async fn write_index(&self, index: &StoreIndex) -> CacheResult<()> {
        let path = self.index_path();
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        let content = serde_json::to_string_pretty(index)?;

        fs::write(&tmp, content)
            .await
            .map_err(|e| CacheError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| CacheError::io(format!("replacing {}", path.display()), e))
    }

    fn archive_name(key: &str, version: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(version.as_bytes());
        format!("{}.tar.gz", hex::encode(&hasher.finalize()[..8]))
    }
}

async fn blocking<T, F>(task: F) -> CacheResult<T>
where
    F: FnOnce() -> CacheResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CacheError::Internal(format!("archive task failed: {e}")))?
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn restore(
        &self,
        root: &Path,
        paths: &[String],
        primary: &str,
        fallbacks: &[String],
    ) -> CacheResult<Option<String>> {
        if !self.dir.exists() {
            debug!("Store {} does not exist yet", self.dir.display());
            return Ok(None);
        }

        let version = paths_version(paths);
        let index = self.load_index().await?;
        let Some(entry) = index.find_match(&version, primary, fallbacks) else {
            return Ok(None);
        };

        let archive_path = self.dir.join(&entry.archive);
        if !archive_path.exists() {
            return Err(CacheError::store(format!(
                "index lists {} but {} is missing",
                entry.key,
                archive_path.display()
            )));
        }

        info!("Restoring {} ({} bytes)", entry.key, entry.size_bytes);
        let dest = root.to_path_buf();
        blocking(move || archive::extract_archive(&archive_path, &dest)).await?;

        Ok(Some(entry.key.clone()))
    }

    async fn save(&self, root: &Path, paths: &[String], key: &str) -> CacheResult<()> {
        let version = paths_version(paths);
        if self.load_index().await?.contains(key, &version) {
            return Err(CacheError::KeyExists(key.to_string()));
        }

        let scan_root = root.to_path_buf();
        let patterns = paths.to_vec();
        let entries = blocking(move || archive::collect_matches(&scan_root, &patterns)).await?;
        if entries.is_empty() {
            return Err(CacheError::NothingToSave(paths.join(", ")));
        }

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io(format!("creating store {}", self.dir.display()), e))?;

        let name = Self::archive_name(key, &version);
        let staging = self.dir.join(format!("{name}.partial"));
        let archive_root = root.to_path_buf();
        let archive_dest = staging.clone();
        let size_bytes =
            blocking(move || archive::create_archive(&archive_root, &entries, &archive_dest)).await?;

        let final_path = self.dir.join(&name);
        fs::rename(&staging, &final_path)
            .await
            .map_err(|e| CacheError::io(format!("finalizing {}", final_path.display()), e))?;

        // Re-read so an entry committed while archiving is not dropped
        let mut index = self.load_index().await?;
        // The archive name is derived from key and version, so the racing
        // entry already points at the file just written
        if index.contains(key, &version) {
            return Err(CacheError::KeyExists(key.to_string()));
        }
        index.entries.push(StoreEntry {
            key: key.to_string(),
            version,
            archive: name,
            created_at: Utc::now(),
            size_bytes,
        });
        self.write_index(&index).await?;

        debug!("Saved {} to {}", key, final_path.display());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "local"
    }
}
