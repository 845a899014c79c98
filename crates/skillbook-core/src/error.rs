use thiserror::Error;

/// Failures that end a `skills` invocation, each with its own exit status.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("validation failed: {errors} error(s)")]
    ValidationFailed { errors: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CommandError {
    /// Process exit status for this failure. Usage errors share clap's code.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Usage(_) => 2,
            CommandError::NotFound(_)
            | CommandError::ValidationFailed { .. }
            | CommandError::Config(_) => 1,
        }
    }
}
