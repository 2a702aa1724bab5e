//! Inspector Harness - Protocol session layer and test harness for
//! DevTools-style browser instrumentation.
//!
//! This library drives a remote browser-engine instance over a
//! `Domain.method` instrumentation protocol and runs test bodies against it.
//!
//! # Architecture
//!
//! Components, leaves first:
//!
//! - **Transport**: text frames over WebSocket or an in-memory pair
//! - **Session**: id correlation, event subscriptions, teardown
//! - **Domain proxy**: `Domain.method` commands checked against a static schema
//! - **Page session**: navigation and script evaluation
//! - **Interception**: exactly-once resolution of paused requests
//! - **Harness**: test run lifecycle with single completion
//!
//! Key design principles:
//!
//! - Each [`ProtocolSession`] owns one transport and one event loop task
//! - Responses are matched by id only; completion order is irrelevant
//! - Events are dispatched in arrival order; `once` handlers never fire twice
//! - Closing a session fails every pending command with [`Error::SessionClosed`]
//!
//! # Quick Start
//!
//! ```no_run
//! use inspector_harness::{HarnessConfig, Result, TestRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HarnessConfig::builder()
//!         .endpoint("ws://127.0.0.1:9222/devtools/browser/6f1c")
//!         .build()?;
//!     let runner = TestRunner::connect(config).await?;
//!
//!     let report = runner
//!         .run("Tests that evaluation works.", |ctx| async move {
//!             let target = ctx.start_blank("Tests that evaluation works.").await?;
//!             let value = target.session.evaluate("1 + 1").await?;
//!             ctx.log(format!("1 + 1 = {value}"));
//!             ctx.complete_test()
//!         })
//!         .await?;
//!
//!     println!("{}", report.output());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`transport`] | [`TransportChannel`] and its adapters |
//! | [`session`] | [`ProtocolSession`], subscriptions |
//! | [`domain`] | [`DomainProxy`] and typed domain wrappers |
//! | [`page`] | [`PageSession`] |
//! | [`interception`] | [`InterceptionController`] |
//! | [`harness`] | [`TestRunner`], [`TestContext`], [`HarnessConfig`] |
//! | [`protocol`] | Wire frames, domains, schema, typed payloads |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Domain proxy.
///
/// - [`DomainProxy`] - `Domain.method` façade over a session
/// - [`DomainHandle`](domain::DomainHandle) - commands and events of one domain
pub mod domain;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Test harness.
///
/// Use [`TestRunner::connect`] or [`TestRunner::with_provider`] to run tests.
pub mod harness;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Network request interception.
pub mod interception;

/// High-level page session.
pub mod page;

/// Protocol message types.
///
/// Wire frames, the [`Domain`] enum and the static schema table.
pub mod protocol;

/// Protocol session layer.
pub mod session;

/// Transport layer.
///
/// The seam between the session and how frames reach the remote engine.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Domain types
pub use domain::{DomainHandle, DomainProxy};

// Error types
pub use error::{Error, Result};

// Harness types
pub use harness::{
    DevToolsTargets, HarnessConfig, HarnessConfigBuilder, MemoryTargets, TargetInfo,
    TargetProvider, TestContext, TestReport, TestRunner, TestTarget,
};

// Identifier types
pub use identifiers::{CommandId, InterceptionId, RunId, SubscriptionId, TargetId};

// Interception types
pub use interception::{InterceptedRequest, InterceptionController, MockResponse, ResolutionState};

// Page types
pub use page::PageSession;

// Protocol types
pub use protocol::{Domain, ErrorReason, Event, RequestPattern, SchemaPolicy};

// Session types
pub use session::{EventWaiter, ProtocolSession, ResponseFuture, Subscription};

// Transport types
pub use transport::{MemoryRemote, TransportChannel};
