//! Configuration schema for openwrt-cache
//!
//! Configuration is stored at `~/.config/openwrt-cache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Local blob store settings
    pub store: StoreConfig,

    /// Toolchain hash sourcing
    pub toolchain: ToolchainConfig,

    /// Host build system settings
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl GeneralConfig {
    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Local blob store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store directory (default: `<data dir>/openwrt-cache/store`)
    pub path: Option<PathBuf>,
}

/// Toolchain hash configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Hash file written by an earlier build step, relative to the build root
    pub hash_file: PathBuf,

    /// Subtrees whose latest commit identifies the toolchain
    pub history_paths: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            hash_file: PathBuf::from(".toolchain.hash"),
            history_paths: vec!["tools".to_string(), "toolchain".to_string()],
        }
    }
}

/// Host build system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Top-level Makefile patched on a toolchain hit, relative to the build root
    pub makefile: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            makefile: PathBuf::from("Makefile"),
        }
    }
}
