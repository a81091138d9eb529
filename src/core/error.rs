use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsAdvisorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },
}

/// Result type alias for Metrics Advisor operations
pub type Result<T> = std::result::Result<T, MetricsAdvisorError>;

impl MetricsAdvisorError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new model validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new not-found error for the given resource kind
    pub fn not_found<S: Into<String>>(kind: &'static str, id: S) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new conflict error
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Returns true if this error was caused by caller input rather than state
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::Validation(_) | Self::Parse { .. }
        )
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::InvalidArgument(_) | Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Parse { .. } => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MetricsAdvisorError::validation("schema has no metrics");
        assert_eq!(err.to_string(), "Validation failed: schema has no metrics");
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_not_found_message() {
        let err = MetricsAdvisorError::not_found("data feed", "abc");
        assert_eq!(err.to_string(), "data feed not found: abc");
        assert_eq!(err.category(), "not_found");
    }

    #[test]
    fn test_client_errors() {
        assert!(MetricsAdvisorError::invalid_argument("bad skip").is_client_error());
        assert!(MetricsAdvisorError::parse("bad token").is_client_error());
        assert!(!MetricsAdvisorError::conflict("duplicate name").is_client_error());
        assert!(!MetricsAdvisorError::config("missing endpoint").is_client_error());
    }
}
