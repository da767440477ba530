use std::fmt;

/// Error type for query API operations.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// No server configured
    NotConfigured,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server rejected the request (4xx with message)
    Validation(String),
    /// Credentials file I/O error
    Io(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NotConfigured => write!(f, "No server configured (set server.baseUrl)"),
            QueryError::Network(msg) => write!(f, "Network error: {}", msg),
            QueryError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            QueryError::Parse(msg) => write!(f, "Parse error: {}", msg),
            QueryError::Validation(msg) => write!(f, "{}", msg),
            QueryError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}
