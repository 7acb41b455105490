//! Structured edits to the host build's Makefile
//!
//! On a toolchain hit the restored `staging_dir` already holds the built
//! tools and toolchain, so the top-level rules that depend on their
//! compile/install stamps are rewritten to drop those prerequisites.
//! Edits are token-exact and scoped to named rules; recipe lines are never
//! touched and re-applying an edit is a no-op.

use crate::error::{CacheError, CacheResult};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

const TOOLCHAIN_STAMPS: &[&str] = &[
    "$(tools/stamp-compile)",
    "$(tools/stamp-install)",
    "$(toolchain/stamp-compile)",
    "$(toolchain/stamp-install)",
];

/// Removal of prerequisite tokens from one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEdit {
    /// Rule target exactly as written before the `:`
    pub rule: String,

    /// Prerequisite tokens to drop
    pub remove: Vec<String>,
}

impl RuleEdit {
    pub fn new(rule: impl Into<String>, remove: &[&str]) -> Self {
        Self {
            rule: rule.into(),
            remove: remove.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Edits that stop the top-level build from recompiling tools and toolchain
    pub fn skip_toolchain() -> Vec<Self> {
        vec![
            Self::new("$(target/stamp-compile)", TOOLCHAIN_STAMPS),
            Self::new("$(toolchain/stamp-compile)", TOOLCHAIN_STAMPS),
            Self::new("$(toolchain/stamp-install)", TOOLCHAIN_STAMPS),
        ]
    }
}

/// Locate the rule colon: the first `:` that is not part of `:=` or `::=`
fn rule_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let pos = line.find(':')?;
    match bytes.get(pos + 1) {
        Some(b'=') => None,
        Some(b':') if bytes.get(pos + 2) == Some(&b'=') => None,
        _ => Some(pos),
    }
}

/// Apply `edits` to a single line, returning the rewritten line and the
/// number of tokens removed
fn edit_line(line: &str, edits: &[RuleEdit]) -> (String, usize) {
    if line.starts_with('\t') || line.trim_start().starts_with('#') {
        return (line.to_string(), 0);
    }
    let Some(colon) = rule_colon(line) else {
        return (line.to_string(), 0);
    };

    let target = line[..colon].trim();
    let Some(edit) = edits.iter().find(|e| e.rule == target) else {
        return (line.to_string(), 0);
    };

    let prereqs: Vec<&str> = line[colon + 1..].split_whitespace().collect();
    let kept: Vec<&str> = prereqs
        .iter()
        .copied()
        .filter(|tok| !edit.remove.iter().any(|r| r == tok))
        .collect();
    let removed = prereqs.len() - kept.len();
    if removed == 0 {
        return (line.to_string(), 0);
    }

    let head = line[..colon].trim_end();
    let rewritten = if kept.is_empty() {
        format!("{head}:")
    } else {
        format!("{head}: {}", kept.join(" "))
    };
    (rewritten, removed)
}

/// Apply `edits` to Makefile text, returning the new text and the number of
/// tokens removed. Line endings are preserved.
pub fn apply_edits(content: &str, edits: &[RuleEdit]) -> (String, usize) {
    let mut out = String::with_capacity(content.len());
    let mut removed = 0;

    for raw in content.split_inclusive('\n') {
        let (body, ending) = if let Some(body) = raw.strip_suffix("\r\n") {
            (body, "\r\n")
        } else if let Some(body) = raw.strip_suffix('\n') {
            (body, "\n")
        } else {
            (raw, "")
        };

        let (line, n) = edit_line(body, edits);
        removed += n;
        out.push_str(&line);
        out.push_str(ending);
    }

    (out, removed)
}

/// Rewrite the Makefile at `path` in place. Returns the number of removed
/// tokens; the file is only written when that number is non-zero.
pub async fn patch_file(path: &Path, edits: &[RuleEdit]) -> CacheResult<usize> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| CacheError::Patch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let (patched, removed) = apply_edits(&content, edits);
    if removed == 0 {
        debug!("{} already lacks the toolchain prerequisites", path.display());
        return Ok(0);
    }

    fs::write(path, patched)
        .await
        .map_err(|e| CacheError::Patch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!("Removed {} prerequisite(s) from {}", removed, path.display());
    Ok(removed)
}
