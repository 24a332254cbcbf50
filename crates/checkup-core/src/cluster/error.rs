use thiserror::Error;

/// Classified failure of a single cluster API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("api error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ClusterError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ClusterError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// The target resource does not exist (or no longer exists).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}
