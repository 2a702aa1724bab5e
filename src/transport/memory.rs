//! In-process transport.
//!
//! [`TransportChannel::memory`] returns a channel whose remote side is a
//! [`MemoryRemote`]. The remote receives every command the session writes and
//! can answer, push events, inject raw frames, or hang up. Used by the test
//! suite and by embedders that host an engine in the same process.

// ============================================================================
// Imports
// ============================================================================

use futures_util::{sink, stream};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::TransportChannel;

// ============================================================================
// RemoteCommand
// ============================================================================

/// A command as seen by the remote end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCommand {
    /// Correlation id.
    pub id: CommandId,
    /// `Domain.command` name.
    pub method: String,
    /// Command parameters.
    #[serde(default)]
    pub params: Value,
}

// ============================================================================
// MemoryRemote
// ============================================================================

/// Remote side of an in-memory transport.
#[derive(Debug)]
pub struct MemoryRemote {
    /// Frames written by the session.
    inbound: mpsc::UnboundedReceiver<String>,
    /// Frames delivered to the session. `None` once hung up.
    outbound: Option<mpsc::UnboundedSender<Result<String>>>,
}

impl TransportChannel {
    /// Creates an in-memory channel and its remote side.
    #[must_use]
    pub fn memory() -> (Self, MemoryRemote) {
        let (to_remote_tx, to_remote_rx) = mpsc::unbounded_channel::<String>();
        let (to_local_tx, to_local_rx) = mpsc::unbounded_channel::<Result<String>>();

        let sink = sink::unfold(to_remote_tx, |tx, frame: String| async move {
            tx.send(frame).map_err(|_| Error::ConnectionClosed)?;
            Ok::<_, Error>(tx)
        });

        let stream = stream::unfold(to_local_rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        });

        let remote = MemoryRemote {
            inbound: to_remote_rx,
            outbound: Some(to_local_tx),
        };

        (Self::new("memory", sink, stream), remote)
    }
}

impl MemoryRemote {
    /// Waits for the next command written by the session.
    ///
    /// Returns `None` once the session side has closed the channel.
    /// Frames that do not parse as commands are skipped.
    pub async fn next_command(&mut self) -> Option<RemoteCommand> {
        loop {
            let frame = self.inbound.recv().await?;
            if let Ok(command) = serde_json::from_str(&frame) {
                return Some(command);
            }
        }
    }

    /// Returns a command if one is already queued.
    pub fn try_next_command(&mut self) -> Option<RemoteCommand> {
        let frame = self.inbound.try_recv().ok()?;
        serde_json::from_str(&frame).ok()
    }

    /// Answers a command with a result object.
    pub fn respond(&self, id: CommandId, result: Value) {
        self.send_value(json!({ "id": id, "result": result }));
    }

    /// Answers a command with an error.
    pub fn respond_error(&self, id: CommandId, code: i64, message: &str) {
        self.send_value(json!({ "id": id, "error": { "code": code, "message": message } }));
    }

    /// Pushes an event.
    pub fn emit(&self, method: &str, params: Value) {
        self.send_value(json!({ "method": method, "params": params }));
    }

    /// Pushes a raw text frame.
    pub fn send_raw(&self, frame: impl Into<String>) {
        if let Some(tx) = &self.outbound {
            let _ = tx.send(Ok(frame.into()));
        }
    }

    /// Closes the remote side; the session observes end of stream.
    pub fn hang_up(&mut self) {
        self.outbound = None;
    }

    fn send_value(&self, value: Value) {
        self.send_raw(value.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
