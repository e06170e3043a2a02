//! Terminal output for the host CLI
//!
//! Uses `cliclack` log lines on a TTY and plain bracketed prefixes
//! (`[OK]`, `[WARN]`) when output is piped or running under CI.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, remark, section, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
