//! Transport channel.
//!
//! A [`TransportChannel`] is a pair of boxed halves: a sink accepting outbound
//! text frames and a stream yielding inbound ones. The protocol session owns
//! exactly one channel and never looks at how frames travel.
//!
//! # Adapters
//!
//! - [`TransportChannel::connect`] - WebSocket client (`ws://` / `wss://`)
//! - [`TransportChannel::memory`] - in-process pair, remote side scripted by a
//!   [`MemoryRemote`](super::MemoryRemote)
//! - [`TransportChannel::new`] - any `Sink<String>` + `Stream<Item = Result<String>>`

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;

use futures_util::future;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Outbound half of a transport.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Inbound half of a transport.
///
/// The stream ends (or yields [`Error::ConnectionClosed`]) when the remote
/// end goes away.
pub type FrameStream = BoxStream<'static, Result<String>>;

// ============================================================================
// TransportChannel
// ============================================================================

/// Bidirectional text-frame channel to one remote target.
pub struct TransportChannel {
    /// Outbound frames.
    sink: FrameSink,
    /// Inbound frames.
    stream: FrameStream,
    /// Human-readable endpoint description.
    label: String,
}

impl fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportChannel")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl TransportChannel {
    /// Wraps an arbitrary sink/stream pair.
    pub fn new<Si, St>(label: impl Into<String>, sink: Si, stream: St) -> Self
    where
        Si: Sink<String, Error = Error> + Send + 'static,
        St: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: stream.boxed(),
            label: label.into(),
        }
    }

    /// Opens a WebSocket connection to a DevTools endpoint.
    ///
    /// # Arguments
    ///
    /// * `url` - WebSocket URL (e.g. `ws://127.0.0.1:9222/devtools/page/ABC`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self> {
        debug!(%url, "Connecting transport");

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect to {url} failed: {e}")))?;

        info!(%url, "Transport connected");

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(Error::from)
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text.into()))));

        let stream = read.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(_)) => Some(Err(Error::ConnectionClosed)),
                // Binary, Ping, Pong, raw frames
                Ok(_) => None,
                Err(e) => Some(Err(Error::from(e))),
            })
        });

        Ok(Self::new(url, sink, stream))
    }

    /// Returns the endpoint description.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Splits the channel into its halves.
    pub(crate) fn into_parts(self) -> (FrameSink, FrameStream) {
        (self.sink, self.stream)
    }
}
