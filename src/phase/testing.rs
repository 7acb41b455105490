//! In-memory collaborators for phase tests

use crate::cache::{BlobStore, FixedClock, StateFile};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::outputs::ActionOutputs;
use crate::phase::PhaseContext;
use crate::toolchain::StaticResolver;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const TEST_HASH: &str = "abc123";
pub const TEST_TIME: i64 = 1_750_000_000;

/// A recorded restore request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreCall {
    pub paths: Vec<String>,
    pub primary: String,
    pub fallbacks: Vec<String>,
}

/// Blob store double that records calls and answers from a script
#[derive(Default)]
pub struct RecordingStore {
    pub restores: Mutex<Vec<RestoreCall>>,
    pub saves: Mutex<Vec<(Vec<String>, String)>>,
    /// Key returned by restore; `None` is a miss
    pub restore_answer: Mutex<Option<String>>,
    pub fail_restore: bool,
    pub fail_save: bool,
}

impl RecordingStore {
    pub fn answering(key: Option<&str>) -> Self {
        Self {
            restore_answer: Mutex::new(key.map(str::to_string)),
            ..Self::default()
        }
    }

    pub fn restore_count(&self) -> usize {
        self.restores.lock().unwrap().len()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn restore(
        &self,
        _root: &Path,
        paths: &[String],
        primary: &str,
        fallbacks: &[String],
    ) -> CacheResult<Option<String>> {
        self.restores.lock().unwrap().push(RestoreCall {
            paths: paths.to_vec(),
            primary: primary.to_string(),
            fallbacks: fallbacks.to_vec(),
        });
        if self.fail_restore {
            return Err(CacheError::store("cache service unreachable"));
        }
        Ok(self.restore_answer.lock().unwrap().clone())
    }

    async fn save(&self, _root: &Path, paths: &[String], key: &str) -> CacheResult<()> {
        self.saves
            .lock()
            .unwrap()
            .push((paths.to_vec(), key.to_string()));
        if self.fail_save {
            return Err(CacheError::store("upload rejected"));
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

/// Context over `workdir` with a missing state file and a miss-answering store
pub fn context(workdir: &Path) -> (PhaseContext, Arc<RecordingStore>) {
    context_with(workdir, RecordingStore::default())
}

/// Context over `workdir` using `store`
pub fn context_with(workdir: &Path, store: RecordingStore) -> (PhaseContext, Arc<RecordingStore>) {
    let store = Arc::new(store);
    let ctx = PhaseContext {
        store: store.clone(),
        resolver: Arc::new(StaticResolver(TEST_HASH.to_string())),
        clock: Arc::new(FixedClock(TEST_TIME)),
        outputs: ActionOutputs::to_file(workdir.join("github_output")),
        state: StateFile::new(workdir.join("state.json")),
        config: Config::default(),
        workdir: workdir.to_path_buf(),
    };
    (ctx, store)
}
