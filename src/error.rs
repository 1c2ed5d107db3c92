use thiserror::Error;

/// Failures of the snapshot backend or the JSON codec.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u64),
}

/// Rejected timer transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("a study timer is already active")]
    AlreadyActive,
    #[error("no study timer is running")]
    NotRunning,
    #[error("no paused study timer to resume")]
    NotPaused,
    #[error("no study timer is active")]
    Idle,
}

/// Errors surfaced by `StudyStore` mutators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound { kind, id: id.into() }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Message returned by the backend, suitable for display.
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("authentication request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from authentication server: {0}")]
    Malformed(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
