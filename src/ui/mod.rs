//! Terminal output for the rescache CLI
//!
//! Uses `cliclack` for styled output and prompts in interactive terminals,
//! with plain line output in CI and when stdout is piped.

mod context;
mod output;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, remark, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use prompts::confirm;
pub use theme::{init_theme, RescacheTheme};
