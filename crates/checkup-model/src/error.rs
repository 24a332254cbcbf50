use thiserror::Error;

/// Errors raised while turning raw key/value data into typed model values.
///
/// Every variant is a configuration problem detected at the boundary, before any
/// cluster resource exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("data field is missing from ConfigMap")]
    MissingData,

    #[error("failed to read checkup {0}")]
    MissingField(&'static str),

    #[error("failed to parse checkup timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("invalid CNI config: {0}")]
    InvalidCniConfig(String),

    #[error("failed to load {0} environment variable")]
    MissingEnv(&'static str),
}

pub type ModelResult<T> = Result<T, ModelError>;
