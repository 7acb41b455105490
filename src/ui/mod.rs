//! UI module for phase summaries
//!
//! Plain bracketed markers in CI logs, symbols in an interactive terminal.

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, section, step_info, step_ok, step_warn};
