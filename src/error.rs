use thiserror::Error;

/// Process-level error: a message plus the exit code the binary returns.
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

/// Errors raised by the forecasting-and-curve pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Required columns are absent from an uploaded table.
    #[error("table '{table}' is missing required column(s): {}", missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    /// Not enough distinct historical timestamps to fit a forecast.
    #[error("insufficient data: need at least {needed} distinct timestamps, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Any other parsing/type failure during ingestion.
    #[error("unexpected value: {0}")]
    UnexpectedValue(String),

    /// File access failure.
    #[error("{0}")]
    Io(String),
}

impl PipelineError {
    pub fn schema(table: impl Into<String>, missing: &[&str]) -> Self {
        Self::Schema {
            table: table.into(),
            missing: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Schema { .. } | PipelineError::Io(_) => 2,
            PipelineError::InsufficientData { .. } => 3,
            PipelineError::UnexpectedValue(_) => 4,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
