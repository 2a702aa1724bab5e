//! Network request interception.
//!
//! While interception is enabled, the engine pauses every request matching
//! the configured patterns and reports it with `Network.requestIntercepted`.
//! Each paused request must be resolved exactly once:
//!
//! ```text
//!             ┌──► Continued
//! Pending ────┼──► Mocked
//!             └──► Failed
//! ```
//!
//! A second resolution of the same interception is a
//! [`ProtocolViolation`](crate::Error::ProtocolViolation). Requests still
//! `Pending` when a test run completes are reported by the harness.

// ============================================================================
// Submodules
// ============================================================================

/// Controller and resolution state machine.
pub mod controller;

/// Intercepted request data and mock responses.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use controller::InterceptionController;
pub use types::{InterceptedRequest, MockResponse, ResolutionState};
