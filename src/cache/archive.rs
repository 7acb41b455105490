//! Archive packing for cache entries
//!
//! Cache paths are globs relative to the build root (`staging_dir/host*`,
//! `.ccache`). Matching walks the root only as deep as the deepest pattern,
//! so a huge `build_dir` next to `staging_dir` is never traversed. A matched
//! directory is archived recursively as a unit.

use crate::error::{CacheError, CacheResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use tracing::debug;
use walkdir::WalkDir;

fn build_globset(patterns: &[String]) -> CacheResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern.trim_start_matches("./"))
                .literal_separator(true)
                .build()?,
        );
    }
    Ok(builder.build()?)
}

/// Deepest directory level any pattern can match
fn walk_depth(patterns: &[String]) -> usize {
    patterns
        .iter()
        .map(|p| {
            if p.contains("**") {
                usize::MAX
            } else {
                p.trim_start_matches("./")
                    .split('/')
                    .filter(|seg| !seg.is_empty())
                    .count()
            }
        })
        .max()
        .unwrap_or(0)
}

/// Paths under `root` matching `patterns`, relative to `root`, sorted
pub fn collect_matches(root: &Path, patterns: &[String]) -> CacheResult<Vec<PathBuf>> {
    let depth = walk_depth(patterns);
    if depth == 0 {
        return Ok(Vec::new());
    }
    let globs = build_globset(patterns)?;

    let mut matches = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            CacheError::io(
                format!("walking {}", root.display()),
                std::io::Error::other(e.to_string()),
            )
        })?;

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if globs.is_match(relative) {
            debug!("Cache path matched: {}", relative.display());
            matches.push(relative.to_path_buf());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
        }
    }

    Ok(matches)
}

/// Write a gzip-compressed tar of `entries` (relative to `root`) to `dest`.
/// Returns the archive size in bytes.
pub fn create_archive(root: &Path, entries: &[PathBuf], dest: &Path) -> CacheResult<u64> {
    let io_err = |what: &str, e: std::io::Error| CacheError::io(format!("{what} {}", dest.display()), e);

    let file = File::create(dest).map_err(|e| io_err("creating archive", e))?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::fast()));
    builder.follow_symlinks(false);

    for relative in entries {
        let absolute = root.join(relative);
        let metadata = std::fs::symlink_metadata(&absolute)
            .map_err(|e| CacheError::io(format!("reading {}", absolute.display()), e))?;

        let appended = if metadata.is_dir() {
            builder.append_dir_all(relative, &absolute)
        } else {
            builder.append_path_with_name(&absolute, relative)
        };
        appended.map_err(|e| CacheError::io(format!("archiving {}", absolute.display()), e))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| io_err("finishing archive", e))?;
    let file = encoder.finish().map_err(|e| io_err("compressing archive", e))?;
    file.sync_all().map_err(|e| io_err("syncing archive", e))?;

    let size = file
        .metadata()
        .map_err(|e| io_err("inspecting archive", e))?
        .len();
    Ok(size)
}

/// Unpack the archive at `src` into `root`, overwriting existing files
pub fn extract_archive(src: &Path, root: &Path) -> CacheResult<()> {
    let file = File::open(src)
        .map_err(|e| CacheError::io(format!("opening archive {}", src.display()), e))?;

    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    archive
        .unpack(root)
        .map_err(|e| CacheError::io(format!("extracting {} into {}", src.display(), root.display()), e))
}
