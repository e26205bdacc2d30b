//! Errors surfaced to the terminal, with their exit codes.

use std::error::Error as StdError;

/// Failure modes of a CLI invocation.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Bad input or configuration; nothing was archived.
    Validation(String),
    /// The run started but did not complete cleanly.
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Validation error carrying the full cause chain of `error`.
    pub(crate) fn config(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Validation(format!("{:#}", anyhow::Error::new(error)))
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}
