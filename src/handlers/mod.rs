//! CLI command handlers.
//!
//! One handler per subcommand, separated from main.rs to enable unit
//! testing of the exit-code contract.

mod pipeline;

use std::process::ExitCode;

pub use pipeline::{handle_align, handle_align_survive, handle_detect_align_survive};

/// Result type for handler functions that can be tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    Success,
    Error(u8),
}

impl From<HandlerResult> for ExitCode {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success => ExitCode::SUCCESS,
            HandlerResult::Error(code) => ExitCode::from(code),
        }
    }
}
