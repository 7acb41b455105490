//! openwrt-cache - Build cache accelerator for OpenWrt
//!
//! Restores compiled host tools, cross toolchains and the compiler cache
//! before an OpenWrt build, and saves them afterwards under keys derived
//! from the toolchain sources' git history.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod makefile;
pub mod outputs;
pub mod phase;
pub mod toolchain;
pub mod ui;

pub use error::{CacheError, CacheResult};
