//! Pipeline inputs shared by the restore and save phases
//!
//! Inputs arrive as loose strings (CLI flags or `INPUT_*` variables set by
//! the CI runner). Boolean inputs are lenient: anything other than
//! `true`/`false` falls back to the input's default.

use std::path::PathBuf;

/// Parse a bool-string input, returning `default` for unrecognized values
pub fn parse_bool_input(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") => true,
        Some("false") => false,
        _ => default,
    }
}

/// Resolved inputs for one phase invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    /// Discriminator prepended to every key (architecture, target, ...)
    pub mixkey: Option<String>,

    /// Build root, relative to the current directory
    pub prefix: Option<PathBuf>,

    /// Skip restoring entirely
    pub clean: bool,

    /// Cache `staging_dir/host*` and `staging_dir/tool*`
    pub toolchain: bool,

    /// On a toolchain hit, drop the toolchain build prerequisites from the Makefile
    pub skip_toolchain_build: bool,

    /// Cache `.ccache` under a per-run key
    pub ccache: bool,

    /// Never save, regardless of cache state
    pub skip_saving: bool,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            mixkey: None,
            prefix: None,
            clean: false,
            toolchain: true,
            skip_toolchain_build: true,
            ccache: false,
            skip_saving: false,
        }
    }
}

impl Inputs {
    /// Normalize the discriminator: surrounding whitespace is dropped and an
    /// empty value counts as absent
    pub fn with_mixkey(mut self, mixkey: Option<&str>) -> Self {
        self.mixkey = mixkey
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        self
    }

    /// Normalize the prefix: an empty value means the current directory
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        self
    }
}
