//! Cache key derivation
//!
//! Keys are `-`-joined segments:
//!
//! ```text
//! [mixkey-]cache-openwrt[-<toolchain hash>][-<unix seconds>]
//! ```
//!
//! The timestamp segment only appears when ccache is cached. It makes every
//! run save a fresh entry, so it is always paired with fallback keys that
//! lack it; restores then land on the newest entry by prefix.

use crate::config::Inputs;
use chrono::Utc;
use serde::Serialize;

/// Constant literal identifying this cache family
pub const NAMESPACE: &str = "cache-openwrt";

/// Segment separator
pub const SEPARATOR: char = '-';

/// Toolchain hash used when none could be determined
pub const UNKNOWN_HASH: &str = "unknown";

/// Toolchain output directories, relative to the build root
pub const TOOLCHAIN_PATHS: &[&str] = &["staging_dir/host*", "staging_dir/tool*"];

/// Compiler cache directory, relative to the build root
pub const CCACHE_PATH: &str = ".ccache";

/// Source of the freshness token
pub trait Clock: Send + Sync {
    /// Current time as Unix seconds
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Everything a phase needs to talk to the blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPlan {
    /// Key to save under, and the first key tried on restore
    pub primary: String,

    /// Prefix keys tried in order when the primary key has no entry
    pub fallbacks: Vec<String>,

    /// Path globs to archive or extract
    pub paths: Vec<String>,

    /// Key up to and including the toolchain segment. A restored key under
    /// this prefix carries a toolchain built from the same sources.
    pub toolchain_key: String,
}

impl KeyPlan {
    /// Whether `matched` was saved from the same toolchain sources as this plan
    pub fn covers_toolchain(&self, matched: &str) -> bool {
        matched == self.toolchain_key
            || matched
                .strip_prefix(self.toolchain_key.as_str())
                .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }
}

/// Namespace-level key: `[mixkey-]cache-openwrt`
pub fn base_key(mixkey: Option<&str>) -> String {
    match mixkey {
        Some(mix) if !mix.is_empty() => format!("{mix}{SEPARATOR}{NAMESPACE}"),
        _ => NAMESPACE.to_string(),
    }
}

/// Build the key plan for `inputs`.
///
/// `toolchain_hash` is only consulted when toolchain caching is enabled;
/// `None` there degrades to [`UNKNOWN_HASH`]. The clock is only read when
/// ccache caching is enabled.
pub fn build(inputs: &Inputs, toolchain_hash: Option<&str>, clock: &dyn Clock) -> KeyPlan {
    let base = base_key(inputs.mixkey.as_deref());
    let mut paths = Vec::new();

    let mut toolchain_key = base.clone();
    if inputs.toolchain {
        let hash = toolchain_hash
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(UNKNOWN_HASH);
        toolchain_key = format!("{toolchain_key}{SEPARATOR}{hash}");
        paths.extend(TOOLCHAIN_PATHS.iter().map(|p| p.to_string()));
    }

    let (primary, candidates) = if inputs.ccache {
        paths.push(CCACHE_PATH.to_string());
        let primary = format!("{toolchain_key}{SEPARATOR}{}", clock.now());
        (primary, vec![toolchain_key.clone(), base])
    } else {
        (toolchain_key.clone(), vec![base])
    };

    let mut fallbacks: Vec<String> = Vec::with_capacity(candidates.len());
    for key in candidates {
        if key != primary && !fallbacks.contains(&key) {
            fallbacks.push(key);
        }
    }

    KeyPlan {
        primary,
        fallbacks,
        paths,
        toolchain_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(mixkey: Option<&str>, toolchain: bool, ccache: bool) -> Inputs {
        Inputs {
            toolchain,
            ccache,
            ..Inputs::default()
        }
        .with_mixkey(mixkey)
    }

    #[test]
    fn plain_key_is_stable() {
        for mixkey in [None, Some("x86_64")] {
            let cfg = inputs(mixkey, false, false);
            let a = build(&cfg, None, &FixedClock(1));
            let b = build(&cfg, None, &FixedClock(2));
            assert_eq!(a, b);
            assert_eq!(a.primary, base_key(mixkey));
            assert!(a.paths.is_empty());
        }
        assert_eq!(build(&inputs(None, false, false), None, &SystemClock).primary, "cache-openwrt");
    }

    #[test]
    fn fallbacks_never_contain_primary() {
        let plan = build(&inputs(None, false, false), None, &FixedClock(0));
        assert!(plan.fallbacks.is_empty());

        let plan = build(&inputs(None, false, true), None, &FixedClock(42));
        assert_eq!(plan.primary, "cache-openwrt-42");
        assert_eq!(plan.fallbacks, vec!["cache-openwrt"]);
    }

    #[test]
    fn toolchain_only_key() {
        let plan = build(&inputs(Some("arm64"), true, false), Some("abc123"), &FixedClock(0));

        assert_eq!(plan.primary, "arm64-cache-openwrt-abc123");
        assert_eq!(plan.fallbacks, vec!["arm64-cache-openwrt"]);
        assert_eq!(plan.paths, vec!["staging_dir/host*", "staging_dir/tool*"]);
        assert_eq!(plan.toolchain_key, plan.primary);
    }

    #[test]
    fn ccache_key_adds_timestamp_and_fallbacks() {
        let plan = build(
            &inputs(Some("arm64"), true, true),
            Some("abc123"),
            &FixedClock(1_750_000_000),
        );

        assert_eq!(plan.primary, "arm64-cache-openwrt-abc123-1750000000");
        assert_eq!(
            plan.fallbacks,
            vec!["arm64-cache-openwrt-abc123", "arm64-cache-openwrt"]
        );
        assert_eq!(
            plan.paths,
            vec!["staging_dir/host*", "staging_dir/tool*", ".ccache"]
        );
    }

    #[test]
    fn timestamps_change_primary_but_not_fallbacks() {
        let cfg = inputs(None, true, true);
        let a = build(&cfg, Some("abc123"), &FixedClock(100));
        let b = build(&cfg, Some("abc123"), &FixedClock(200));

        assert_ne!(a.primary, b.primary);
        assert_eq!(a.fallbacks, b.fallbacks);
        assert_eq!(a.paths, b.paths);
    }

    #[test]
    fn fallbacks_are_strict_prefixes_of_primary() {
        for (toolchain, ccache) in [(true, true), (true, false), (false, true)] {
            let plan = build(&inputs(Some("mips"), toolchain, ccache), Some("deadbee"), &FixedClock(7));
            for fallback in &plan.fallbacks {
                assert_ne!(fallback, &plan.primary);
                assert!(plan.primary.starts_with(fallback.as_str()));
            }
        }
    }

    #[test]
    fn missing_hash_uses_sentinel() {
        let plan = build(&inputs(None, true, false), None, &FixedClock(0));
        assert_eq!(plan.primary, "cache-openwrt-unknown");

        let plan = build(&inputs(None, true, false), Some("  \n"), &FixedClock(0));
        assert_eq!(plan.primary, "cache-openwrt-unknown");
    }

    #[test]
    fn hash_ignored_without_toolchain() {
        let plan = build(&inputs(None, false, false), Some("abc123"), &FixedClock(0));
        assert_eq!(plan.primary, "cache-openwrt");
    }

    #[test]
    fn covers_toolchain_requires_segment_boundary() {
        let plan = build(&inputs(None, true, true), Some("abc123"), &FixedClock(5));

        assert!(plan.covers_toolchain("cache-openwrt-abc123"));
        assert!(plan.covers_toolchain("cache-openwrt-abc123-4"));
        assert!(!plan.covers_toolchain("cache-openwrt-abc1234-4"));
        assert!(!plan.covers_toolchain("cache-openwrt-fff000-4"));
        assert!(!plan.covers_toolchain("cache-openwrt"));
    }
}
