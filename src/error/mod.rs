//! Error types for toolrelay.

use thiserror::Error;

/// Broad error category, one per failure domain a query can abort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    ToolInvocation,
    Model,
}

/// Primary error type for all toolrelay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Tool invocation error: {tool_name}: {message}")]
    ToolInvocation { tool_name: String, message: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Create a model API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool invocation error for `tool_name`.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Connection(_) | Self::Io(_) => ErrorCategory::Connection,
            Self::ToolInvocation { .. } => ErrorCategory::ToolInvocation,
            Self::Model(_) | Self::Api { .. } | Self::Network(_) | Self::Serialization(_) => {
                ErrorCategory::Model
            }
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RelayError>;
