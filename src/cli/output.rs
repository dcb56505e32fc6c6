//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Exit status for a submission that ran but did not complete.
pub const EXIT_SUBMISSION_INCOMPLETE: i32 = 2;

/// Text and success flag produced by one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    pub fn incomplete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    e.to_string()
}
