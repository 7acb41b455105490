//! CLI argument definitions using clap derive
//!
//! Every phase input can also come from the `INPUT_*` variables a CI runner
//! sets for action inputs. Boolean inputs are bool-strings (`true`/`false`);
//! unrecognized values fall back to the input's default.

use crate::config::{parse_bool_input, Inputs};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// openwrt-cache - toolchain and ccache cache for OpenWrt builds
///
/// Restores staging_dir toolchains and .ccache before a build and saves
/// them afterwards, keyed by the toolchain sources' latest commit.
#[derive(Parser, Debug)]
#[command(name = "openwrt-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "OPENWRT_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// File carrying the cache state from restore to save
    #[arg(long, global = true, env = "OPENWRT_CACHE_STATE")]
    pub state_file: Option<PathBuf>,

    /// Local cache store directory
    #[arg(long, global = true, env = "OPENWRT_CACHE_STORE")]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore cached artifacts before the build
    ///
    /// Reports `hit=1` only when the restored entry carries the current
    /// toolchain. An entry from a different toolchain is still restored for
    /// its compiler cache, but reports `hit=0` and leaves the Makefile alone.
    Restore(RestoreArgs),

    /// Save artifacts after the build
    Save(SaveArgs),

    /// Print the cache key plan without touching the store
    Key(KeyArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Inputs shared by every phase
#[derive(Args, Debug, Default)]
pub struct CommonInputArgs {
    /// Discriminator prepended to cache keys (architecture, target)
    #[arg(long, env = "INPUT_MIXKEY")]
    pub mixkey: Option<String>,

    /// OpenWrt source directory, relative to the current directory
    #[arg(long, env = "INPUT_PREFIX")]
    pub prefix: Option<String>,

    /// Cache staging_dir/host* and staging_dir/tool* [default: true]
    #[arg(long, env = "INPUT_TOOLCHAIN", value_name = "BOOL")]
    pub toolchain: Option<String>,

    /// Cache .ccache under a per-run key [default: false]
    #[arg(long, env = "INPUT_CCACHE", value_name = "BOOL")]
    pub ccache: Option<String>,
}

impl CommonInputArgs {
    fn inputs(&self) -> Inputs {
        Inputs {
            toolchain: parse_bool_input(self.toolchain.as_deref(), true),
            ccache: parse_bool_input(self.ccache.as_deref(), false),
            ..Inputs::default()
        }
        .with_mixkey(self.mixkey.as_deref())
        .with_prefix(self.prefix.as_deref())
    }
}

/// Arguments for the restore command
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub common: CommonInputArgs,

    /// Do not restore anything [default: false]
    #[arg(long, env = "INPUT_CLEAN", value_name = "BOOL")]
    pub clean: Option<String>,

    /// On a toolchain hit, skip compiling tools and toolchain [default: true]
    #[arg(long, env = "INPUT_SKIP", value_name = "BOOL")]
    pub skip: Option<String>,
}

impl RestoreArgs {
    /// Resolve the restore phase inputs
    pub fn inputs(&self) -> Inputs {
        Inputs {
            clean: parse_bool_input(self.clean.as_deref(), false),
            skip_toolchain_build: parse_bool_input(self.skip.as_deref(), true),
            ..self.common.inputs()
        }
    }
}

/// Arguments for the save command
#[derive(Parser, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub common: CommonInputArgs,

    /// Never save [default: false]
    #[arg(long, env = "INPUT_SKIP_SAVING", value_name = "BOOL")]
    pub skip_saving: Option<String>,
}

impl SaveArgs {
    /// Resolve the save phase inputs
    pub fn inputs(&self) -> Inputs {
        Inputs {
            skip_saving: parse_bool_input(self.skip_saving.as_deref(), false),
            ..self.common.inputs()
        }
    }
}

/// Which phase's toolchain hash source to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyPhase {
    /// Latest commit touching tools/ and toolchain/
    Restore,
    /// The toolchain hash file
    Save,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub common: CommonInputArgs,

    /// Resolve the toolchain hash the way this phase does
    #[arg(long, value_enum, default_value = "restore")]
    pub phase: KeyPhase,
}

impl KeyArgs {
    pub fn inputs(&self) -> Inputs {
        self.common.inputs()
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
