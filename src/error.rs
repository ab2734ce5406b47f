//! Diamond Pull Error Types
//!
//! Two kinds of failure come out of a pull. [`DiamondError`] aborts the whole
//! call; [`FetchFailure`] only drops a single group from the merged result.

use thiserror::Error;

/// Fatal error for a pull operation
#[derive(Debug, Error)]
pub enum DiamondError {
    /// Configuration errors (missing endpoint, unreadable file, client setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server discovery returned a non-200 status
    #[error("Server discovery failed: {endpoint} returned status {status}")]
    Discovery { endpoint: String, status: u16 },

    /// RAM credential endpoint returned a non-200 status
    #[error("Failed to fetch credentials for RAM role '{role}': status {status}")]
    Credentials { role: String, status: u16 },

    /// RAM credential endpoint answered with something unusable
    #[error("Invalid credentials for RAM role '{role}': {reason}")]
    InvalidCredentials { role: String, reason: String },

    /// HTTP request failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Response parsing failed
    #[error("Response error: {0}")]
    Response(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DiamondError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DiamondError::Timeout(err.to_string())
        } else if err.is_connect() {
            DiamondError::Request(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            DiamondError::Response(format!("Failed to decode response: {}", err))
        } else if err.is_builder() {
            DiamondError::Config(format!("Invalid request: {}", err))
        } else {
            DiamondError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DiamondError {
    fn from(err: serde_json::Error) -> Self {
        DiamondError::Response(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for DiamondError {
    fn from(err: std::io::Error) -> Self {
        DiamondError::Config(format!("IO error: {}", err))
    }
}

/// Why a single group contributed nothing to the merged result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The server does not know the group (HTTP 404)
    #[error("group not found")]
    NotFound,

    /// Any other non-200 status
    #[error("get config failed with status {0}")]
    Status(u16),

    /// Connection, timeout or header problems
    #[error("transport error: {0}")]
    Transport(String),

    /// 200 with a body that is not a JSON object
    #[error("invalid config body: {0}")]
    Decode(String),

    /// Discovery produced an empty server pool
    #[error("no config server available")]
    NoServer,
}

/// Result type alias for fatal pull operations
pub type Result<T> = std::result::Result<T, DiamondError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DiamondError::Discovery {
            endpoint: "cfg.example.com".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Server discovery failed: cfg.example.com returned status 503"
        );

        let err = DiamondError::Credentials {
            role: "app-role".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("'app-role'"));

        assert_eq!(FetchFailure::NotFound.to_string(), "group not found");
        assert_eq!(
            FetchFailure::Status(500).to_string(),
            "get config failed with status 500"
        );
    }

    #[test]
    fn test_json_error_is_response_error() {
        let err: DiamondError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DiamondError::Response(_)));
    }
}
