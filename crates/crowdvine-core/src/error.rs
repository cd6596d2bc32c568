//! Error types for Crowdvine Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration not found")]
    ConfigNotFound,

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // Collaborator errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error must stop the process before it serves traffic
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::ConfigNotFound | Error::ConfigValidation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_fatal() {
        assert!(Error::Config("missing".to_string()).is_fatal_configuration());
        assert!(Error::ConfigNotFound.is_fatal_configuration());
        assert!(Error::ConfigValidation("port".to_string()).is_fatal_configuration());
        assert!(!Error::NotFound("header_logo_pact".to_string()).is_fatal_configuration());
        assert!(!Error::Upstream("timeout".to_string()).is_fatal_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("footer_logo_dirtywine".to_string());
        assert_eq!(err.to_string(), "Not found: footer_logo_dirtywine");
    }
}
