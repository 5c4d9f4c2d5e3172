use thiserror::Error;

/// Failure taxonomy for backend calls. The workflow engine treats every
/// variant the same way (surface the message, keep the step retryable);
/// the split exists so callers can tell a missing record from a rejected
/// mutation or a transport problem.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The backend understood the request and refused it. `reason` carries
    /// the backend's own detail text when it provides one.
    #[error("backend rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("backend returned HTTP {status}")]
    Http { status: u16 },

    #[error("network error talking to backend: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        BackendError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        BackendError::Rejected {
            reason: reason.into(),
        }
    }
}
