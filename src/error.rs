//! Error types for the ABN Lookup client library.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AbnLookupError>;

/// Error type for all ABR search operations
#[derive(Error, Debug)]
pub enum AbnLookupError {
    /// A required parameter was absent or empty; raised before any request is sent
    #[error("Missing required parameter `{parameter}` for {operation}")]
    MissingParameter {
        operation: &'static str,
        parameter: String,
    },

    /// A parameter was present but could not be used as given
    #[error("Invalid value for `{parameter}`: {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Network, timeout or HTTP status errors
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be parsed or lacks the expected structure
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The ABR service answered with an exception payload
    #[error("ABR service error ({code}): {description}")]
    Upstream { code: String, description: String },

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    UrlParsing(#[from] url::ParseError),
}

impl AbnLookupError {
    /// Create a new missing parameter error
    pub fn missing(operation: &'static str, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            operation,
            parameter: parameter.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Upstream {
            code: code.into(),
            description: description.into(),
        }
    }

    /// True when the error was raised while building the request, before any I/O
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AbnLookupError::MissingParameter { .. }
                | AbnLookupError::InvalidParameter { .. }
                | AbnLookupError::UrlParsing(_)
        )
    }

    /// True when the ABR service itself rejected the search
    pub fn is_upstream(&self) -> bool {
        matches!(self, AbnLookupError::Upstream { .. })
    }
}
