//! Terminal output helpers shared by the CLI commands
//!
//! Styled glyphs on an interactive terminal, bracketed tags otherwise so
//! output piped into files or CI logs stays greppable.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, key_value_status, step_info, step_ok, step_ok_detail, step_warn_hint};
