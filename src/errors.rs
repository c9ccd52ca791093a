use thiserror::Error;

/// Error type shared by the driver, the navigator and the UI.
#[derive(Error, Debug)]
pub enum DashError {
    /// Login failed: bad credentials, refused connection or unavailable service.
    #[error("{0}")]
    Auth(String),
    /// A statement failed. Carries the service message unchanged.
    #[error("{0}")]
    Query(String),
    /// Form input rejected before any statement was sent.
    #[error("{0}")]
    Validation(String),
    /// Configuration error (e.g., missing account or malformed endpoint).
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DashError::Validation(_))
    }
}
