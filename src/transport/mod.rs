//! Transport layer.
//!
//! This module carries text frames between the local end (this crate) and a
//! remote engine instance. How frames travel is opaque to the protocol
//! session; it only sees a [`TransportChannel`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │ ProtocolSession  │       TransportChannel       │  Remote engine  │
//! │                  │◄────────────────────────────►│  (page target)  │
//! │  event loop      │   WebSocket | in-memory      │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Boxed sink/stream pair and the WebSocket adapter |
//! | `memory` | In-process adapter with a scriptable remote side |

// ============================================================================
// Submodules
// ============================================================================

/// Transport channel and WebSocket adapter.
pub mod channel;

/// In-process transport.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{FrameSink, FrameStream, TransportChannel};
pub use memory::{MemoryRemote, RemoteCommand};
