use std::path::PathBuf;

/// Application-level error: a user-facing message plus the process exit code.
///
/// Exit codes:
/// - `2`: configuration / usage errors
/// - `3`: one or more timepoints failed
/// - `4`: internal errors
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(3, err.to_string())
    }
}

/// Errors local to a single timepoint's pipeline.
///
/// None of these abort other timepoints; the orchestrator records them per
/// timepoint and carries on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A source file is missing or its stream could not be read.
    #[error("source unavailable '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row lacks `Culture Number` / `Count` or a value fails numeric coercion.
    #[error("malformed row in '{}' (line {line}): {message}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The two aggregated series cannot be paired by position.
    #[error("cannot pair series of different lengths (x: {x_len}, y: {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },

    /// The regression could not produce a usable line.
    #[error("regression failed: {0}")]
    Fit(String),

    /// The chart could not be drawn or encoded.
    #[error("chart rendering failed: {0}")]
    RenderFailure(String),

    /// The encoded image could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_timepoint_failure_exit_code() {
        let err: AppError = PipelineError::LengthMismatch { x_len: 3, y_len: 4 }.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("x: 3, y: 4"));
    }
}
