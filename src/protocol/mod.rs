//! Protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (this crate) and the remote engine.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//! | `Event` | Remote → Local | Engine notification |
//!
//! # Member Naming
//!
//! Commands and events follow `Domain.member` format:
//!
//! - `Runtime.evaluate`
//! - `Page.loadEventFired`
//! - `Network.continueInterceptedRequest`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `domain` | The [`Domain`] enum |
//! | `message` | Request, Response and Event frames |
//! | `schema` | Static table of known commands and events |
//! | `types` | Typed payloads used by the crate |

// ============================================================================
// Submodules
// ============================================================================

/// Protocol domains.
pub mod domain;

/// Wire frames.
pub mod message;

/// Static member schema.
pub mod schema;

/// Typed command payloads.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use domain::{ALL_DOMAINS, Domain, split_method};
pub use message::{Event, Incoming, RemoteErrorBody, Request, Response};
pub use schema::{MemberKind, MemberSpec, SCHEMA, SchemaPolicy};
pub use types::{
    ContinueInterceptedRequestParams, CreateTargetResult, ErrorReason, EvaluateParams,
    EvaluateResult, ExceptionDetails, InterceptionStage, NavigateResult, NetworkRequest,
    RemoteObject, RequestInterceptedParams, RequestPattern,
};
