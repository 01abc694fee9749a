use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    /// Every research call in a non-empty batch failed; there is nothing to report.
    #[error("Run failed: none of the {attempted} entities in batch {batch_index} were researched successfully")]
    FatalRun { batch_index: usize, attempted: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl RiskWatchError {
    /// Errors raised before any remote call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RiskWatchError::Config(_) | RiskWatchError::Input(_))
    }
}
