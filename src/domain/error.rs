//! Domain error types.

/// Top-level error type for momentrader.
#[derive(Debug, thiserror::Error)]
pub enum MomentraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient history: have {available} values, need {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("zero-variance subsample {index} at subdivision level {level}")]
    DegenerateSubsample { level: u32, index: usize },

    #[error("degenerate regression: {reason}")]
    DegenerateRegression { reason: String },

    #[error("allocation invariant violated: {reason}")]
    AllocationInvariant { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MomentraderError {
    /// True for errors the engine absorbs as a missing estimate for one step.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MomentraderError::InsufficientHistory { .. }
                | MomentraderError::DegenerateSubsample { .. }
                | MomentraderError::DegenerateRegression { .. }
        )
    }
}

impl From<&MomentraderError> for std::process::ExitCode {
    fn from(err: &MomentraderError) -> Self {
        let code: u8 = match err {
            MomentraderError::Io(_) => 1,
            MomentraderError::ConfigParse { .. }
            | MomentraderError::ConfigMissing { .. }
            | MomentraderError::ConfigInvalid { .. } => 2,
            MomentraderError::Data { .. } => 3,
            MomentraderError::AllocationInvariant { .. } => 4,
            MomentraderError::NoData { .. }
            | MomentraderError::InsufficientHistory { .. }
            | MomentraderError::DegenerateSubsample { .. }
            | MomentraderError::DegenerateRegression { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
