//! Protocol session layer.
//!
//! A [`ProtocolSession`] multiplexes concurrent commands and asynchronous
//! events over one [`TransportChannel`](crate::transport::TransportChannel).
//!
//! # Correlation
//!
//! Each command gets a session-unique numeric id. Responses are matched by
//! id alone, so futures resolve in whatever order the remote end answers.
//! A response for an id that is not pending is a protocol violation; it is
//! recorded on the session and surfaced by the harness.
//!
//! # Events
//!
//! ```ignore
//! let waiter = session.wait_for("Page.loadEventFired");
//! session.send(Domain::Page, "reload", Value::Null).await?;
//! let event = waiter.await?;
//!
//! let subscription = session.subscribe("Network.loadingFinished", |event| {
//!     tracing::info!(request_id = event.get_str("requestId"), "finished");
//! }, false);
//! subscription.cancel();
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | [`ProtocolSession`], [`ResponseFuture`], event loop |
//! | `subscription` | Subscription registry, [`Subscription`], [`EventWaiter`] |

// ============================================================================
// Submodules
// ============================================================================

/// Session handle and event loop.
pub mod connection;

/// Event subscriptions.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ProtocolSession, ResponseFuture};
pub use subscription::{EventHandler, EventWaiter, Subscription};
