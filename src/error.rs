//! Error types for the inspector harness.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use inspector_harness::{Error, Result};
//!
//! async fn example(session: &PageSession) -> Result<()> {
//!     match session.evaluate("undefinedFunction()").await {
//!         Err(Error::EvaluationException { description }) => println!("{description}"),
//!         other => { other?; }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::SessionClosed`] |
//! | Protocol | [`Error::Remote`], [`Error::ProtocolViolation`], [`Error::UnknownMethod`], [`Error::InvalidArgument`] |
//! | Page | [`Error::EvaluationException`], [`Error::Navigation`] |
//! | Interception | [`Error::InterceptNotFound`] |
//! | Harness | [`Error::IncompleteRun`], [`Error::Timeout`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when harness configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport connection failed.
    ///
    /// Returned when the channel to the remote engine cannot be established
    /// or a frame cannot be written.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The transport was closed by the remote end.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The protocol session was torn down while the operation was outstanding.
    ///
    /// Every pending command and every pending event waiter fails with this
    /// error when a session closes.
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The remote end rejected a command.
    #[error("Remote error {code}: {message}")]
    Remote {
        /// Protocol error code.
        code: i64,
        /// Error message reported by the remote end.
        message: String,
    },

    /// Protocol violation.
    ///
    /// Duplicate or unknown response ids, double-resolved interceptions and
    /// double completion of a test run. Never retryable.
    #[error("Protocol violation: {message}")]
    ProtocolViolation {
        /// Description of the violation.
        message: String,
    },

    /// Method is not present in the protocol schema.
    ///
    /// Only returned under [`SchemaPolicy::Strict`](crate::protocol::SchemaPolicy).
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// Fully qualified `Domain.method` name.
        method: String,
    },

    /// Invalid argument in command params.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Page Errors
    // ========================================================================
    /// Script evaluation raised an exception in the remote context.
    #[error("Evaluation exception: {description}")]
    EvaluationException {
        /// Exception description reported by the remote runtime.
        description: String,
    },

    /// Navigation was rejected by the remote end.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL.
        url: String,
        /// Error text reported for the navigation.
        reason: String,
    },

    // ========================================================================
    // Interception Errors
    // ========================================================================
    /// Interception id is not known to the controller.
    #[error("Intercept not found: {interception_id}")]
    InterceptNotFound {
        /// The missing interception ID.
        interception_id: String,
    },

    // ========================================================================
    // Harness Errors
    // ========================================================================
    /// The test body finished without signalling completion.
    #[error("Test run '{description}' ended without completion")]
    IncompleteRun {
        /// Description of the run.
        description: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }

    /// Creates a protocol violation error.
    #[inline]
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Creates an unknown method error.
    #[inline]
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an evaluation exception error.
    #[inline]
    pub fn evaluation_exception(description: impl Into<String>) -> Self {
        Self::EvaluationException {
            description: description.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an intercept not found error.
    #[inline]
    pub fn intercept_not_found(interception_id: impl Into<String>) -> Self {
        Self::InterceptNotFound {
            interception_id: interception_id.into(),
        }
    }

    /// Creates an incomplete run error.
    #[inline]
    pub fn incomplete_run(description: impl Into<String>) -> Self {
        Self::IncompleteRun {
            description: description.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the remote end rejected a command.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this is a protocol violation.
    #[inline]
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Returns `true` if the session was closed under the operation.
    #[inline]
    #[must_use]
    pub fn is_session_closed(&self) -> bool {
        matches!(self, Self::SessionClosed)
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = Error::remote(-32601, "'Foo.bar' wasn't found");
        assert_eq!(err.to_string(), "Remote error -32601: 'Foo.bar' wasn't found");
        assert!(err.is_remote());
    }

    #[test]
    fn test_evaluation_exception_is_not_remote() {
        let err = Error::evaluation_exception("ReferenceError: x is not defined");
        assert!(!err.is_remote());
        assert_eq!(
            err.to_string(),
            "Evaluation exception: ReferenceError: x is not defined"
        );
    }

    #[test]
    fn test_is_protocol_violation() {
        assert!(Error::protocol_violation("duplicate id 3").is_protocol_violation());
        assert!(!Error::SessionClosed.is_protocol_violation());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("refused").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::SessionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::timeout("test run", 1000).is_timeout());
        assert!(!Error::incomplete_run("x").is_timeout());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
