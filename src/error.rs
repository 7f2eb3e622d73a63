//! Error types for mcp-server-kit.
//!
//! Two families live here:
//!
//! - [`ConfigError`] for loading the configuration file
//! - [`McpError`] for registry and dispatch failures, each of which maps onto
//!   exactly one JSON-RPC error code

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::mcp::protocol::{ErrorCode, JsonRpcErrorData};

/// Errors returned by embedder-supplied handler callbacks.
///
/// A handler that panics instead of returning an error is treated the same
/// way: the panic is caught and reported as a failure of that one call.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Runs an embedder callback, converting a panic into a [`HandlerError`].
pub(crate) fn call_handler<T>(
    handler: impl FnOnce() -> Result<T, HandlerError>,
) -> Result<T, HandlerError> {
    panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        tracing::error!(panic = %message, "Handler panicked");
        Err(format!("handler panicked: {message}").into())
    })
}

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Typed errors raised by the registries and the dispatcher.
///
/// Each variant maps 1:1 onto a JSON-RPC error response via
/// [`McpError::to_error_data`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    /// Malformed JSON at the transport boundary.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structurally invalid envelope, or a call made before initialisation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown top-level method.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Unknown tool, resource or prompt.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up ("Tool", "Resource", "Prompt").
        kind: &'static str,
        /// The name or URI that did not match.
        name: String,
    },

    /// A registration reused an existing key.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// What was being registered.
        kind: &'static str,
        /// The duplicated key.
        name: String,
    },

    /// A registration was incomplete or malformed.
    #[error("Invalid {kind} definition: {reason}")]
    InvalidDefinition {
        /// What was being registered.
        kind: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Call parameters absent or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Handler failure or structurally invalid handler output.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Returns the JSON-RPC error code this error maps to.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ParseError,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MethodNotFound(_) | Self::NotFound { .. } => ErrorCode::MethodNotFound,
            Self::AlreadyExists { .. } | Self::InvalidDefinition { .. } | Self::InvalidParams(_) => {
                ErrorCode::InvalidParams
            }
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns the optional details string carried alongside the message.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::NotFound { name, .. } | Self::AlreadyExists { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    /// Converts this error into the `error` member of a JSON-RPC response.
    #[must_use]
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        let data = JsonRpcErrorData::with_message(self.code(), self.to_string());
        match self.details() {
            Some(details) => data.with_data(Value::String(details)),
            None => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicking_handler_becomes_error() {
        let result: Result<(), HandlerError> = call_handler(|| panic!("kaboom"));
        assert_eq!(result.unwrap_err().to_string(), "handler panicked: kaboom");

        let formatted: Result<(), HandlerError> = call_handler(|| panic!("code {}", 7));
        assert_eq!(formatted.unwrap_err().to_string(), "handler panicked: code 7");
    }

    #[test]
    fn returning_handler_passes_through() {
        let result = call_handler(|| Ok::<_, HandlerError>(5));
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn not_found_maps_to_method_not_found() {
        let error = McpError::NotFound {
            kind: "Resource",
            name: "memory://missing".to_string(),
        };
        let data = error.to_error_data();
        assert_eq!(data.code, -32601);
        assert_eq!(data.message, "Resource not found: memory://missing");
        assert_eq!(data.data, Some(Value::String("memory://missing".to_string())));
    }

    #[test]
    fn registration_errors_map_to_invalid_params() {
        let dup = McpError::AlreadyExists {
            kind: "Tool",
            name: "add".to_string(),
        };
        assert_eq!(dup.code(), ErrorCode::InvalidParams);

        let bad = McpError::InvalidDefinition {
            kind: "Tool",
            reason: "name cannot be empty".to_string(),
        };
        assert_eq!(bad.code(), ErrorCode::InvalidParams);
        assert!(bad.to_error_data().data.is_none());
    }

    #[test]
    fn internal_error_code() {
        let error = McpError::Internal("boom".to_string());
        assert_eq!(error.to_error_data().code, -32603);
        assert!(error.to_string().contains("boom"));
    }
}
