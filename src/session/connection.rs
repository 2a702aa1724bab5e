//! Protocol session and event loop.
//!
//! A [`ProtocolSession`] owns one [`TransportChannel`] and spawns a tokio task
//! that handles:
//!
//! - Outgoing command frames from the API
//! - Incoming responses, correlated to pending commands by id
//! - Incoming events, routed to subscriptions in arrival order
//! - Teardown: failing every pending command with [`Error::SessionClosed`]
//!
//! Frames are handled one at a time by the loop, so the dispatch of one frame
//! completes before the next is read.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::{Domain, Event, Incoming, Request, split_method};
use crate::transport::{FrameSink, FrameStream, TransportChannel};

use super::subscription::{
    EventHandler, EventWaiter, Subscription, SubscriptionRegistry, dispatch,
};

// ============================================================================
// Types
// ============================================================================

/// Map of command ids to response channels.
type CorrelationMap = FxHashMap<CommandId, oneshot::Sender<Result<Value>>>;

/// Internal commands for the event loop.
enum LoopCommand {
    /// Write a serialized command frame.
    Send { id: CommandId, text: String },
    /// Close the transport and stop.
    Shutdown,
}

/// State shared between session handles and the event loop.
struct Shared {
    /// Pending commands.
    correlation: Mutex<CorrelationMap>,
    /// Event subscriptions.
    subscriptions: Arc<Mutex<SubscriptionRegistry>>,
    /// Escalated protocol violations.
    violations: Mutex<Vec<String>>,
    /// Set once teardown has started. Guarded by `correlation` for writers.
    closed: AtomicBool,
    /// Woken when teardown completes.
    closed_notify: Notify,
}

impl Shared {
    fn record_violation(&self, message: String) {
        warn!(violation = %message, "Protocol violation");
        self.violations.lock().push(message);
    }
}

// ============================================================================
// ResponseFuture
// ============================================================================

/// Future resolving with the result of one command.
///
/// The command is already written (or queued for writing) when the future is
/// returned; awaiting it only waits for the response.
pub struct ResponseFuture {
    id: Option<CommandId>,
    state: ResponseState,
}

enum ResponseState {
    Waiting(oneshot::Receiver<Result<Value>>),
    Failed(Option<Error>),
}

impl ResponseFuture {
    fn waiting(id: CommandId, rx: oneshot::Receiver<Result<Value>>) -> Self {
        Self {
            id: Some(id),
            state: ResponseState::Waiting(rx),
        }
    }

    pub(crate) fn failed(error: Error) -> Self {
        Self {
            id: None,
            state: ResponseState::Failed(Some(error)),
        }
    }

    /// Returns the command id, or `None` if the command was never issued.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        self.id
    }
}

impl fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            ResponseState::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_)) => Poll::Ready(Err(Error::SessionClosed)),
                Poll::Pending => Poll::Pending,
            },
            ResponseState::Failed(error) => {
                Poll::Ready(Err(error.take().unwrap_or(Error::SessionClosed)))
            }
        }
    }
}

// ============================================================================
// ProtocolSession
// ============================================================================

/// The logical conversation with one remote target.
///
/// Cheap to clone; all clones share the same event loop, pending command
/// table and subscription registry. The session tears down when
/// [`close`](Self::close) is called, when the transport ends, or when the last
/// handle is dropped.
///
/// # Thread Safety
///
/// `ProtocolSession` is `Send + Sync`. Issuing a command never blocks.
#[derive(Clone)]
pub struct ProtocolSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    /// Endpoint description.
    label: String,
    /// Channel into the event loop.
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    /// Next command id.
    next_id: AtomicU64,
    /// State shared with the event loop.
    shared: Arc<Shared>,
    /// Enabled domains. Held across the enable round trip.
    enabled: tokio::sync::Mutex<FxHashSet<Domain>>,
    /// Event loop task.
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ProtocolSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolSession")
            .field("label", &self.inner.label)
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ProtocolSession {
    /// Creates a session over a transport channel.
    ///
    /// Spawns the event loop task; must be called within a tokio runtime.
    #[must_use]
    pub fn new(channel: TransportChannel) -> Self {
        let label = channel.label().to_string();
        let (sink, stream) = channel.into_parts();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            correlation: Mutex::new(CorrelationMap::default()),
            subscriptions: Arc::new(Mutex::new(SubscriptionRegistry::default())),
            violations: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            closed_notify: Notify::new(),
        });

        let handle = tokio::spawn(run_event_loop(
            label.clone(),
            sink,
            stream,
            command_rx,
            Arc::clone(&shared),
        ));

        debug!(label = %label, "Protocol session started");

        Self {
            inner: Arc::new(SessionInner {
                label,
                command_tx,
                next_id: AtomicU64::new(1),
                shared,
                enabled: tokio::sync::Mutex::new(FxHashSet::default()),
                event_loop: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Connects to a WebSocket endpoint and starts a session on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let channel = TransportChannel::connect(url).await?;
        Ok(Self::new(channel))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Issues `domain.method` with `params`.
    ///
    /// The command is recorded and queued before this returns; the future
    /// resolves with the response `result` object.
    ///
    /// # Errors
    ///
    /// The future fails with:
    /// - [`Error::Remote`] if the response carries an `error` field
    /// - [`Error::SessionClosed`] if the session closes first
    /// - [`Error::Connection`] if the frame cannot be written
    pub fn send(&self, domain: Domain, method: &str, params: Value) -> ResponseFuture {
        self.issue(domain.qualify(method), params)
    }

    /// Issues a command by its fully qualified `Domain.method` name.
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::InvalidArgument`] if `method` is not of
    /// the form `Domain.method`; otherwise as [`send`](Self::send).
    pub fn send_method(&self, method: &str, params: Value) -> ResponseFuture {
        if split_method(method).is_none() {
            return ResponseFuture::failed(Error::invalid_argument(format!(
                "'{method}' is not a Domain.method name"
            )));
        }
        self.issue(method.to_string(), params)
    }

    fn issue(&self, method: String, params: Value) -> ResponseFuture {
        let id = CommandId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(id, method, params);

        let text = match serde_json::to_string(&request) {
            Ok(text) => text,
            Err(e) => return ResponseFuture::failed(Error::Json(e)),
        };

        let (tx, rx) = oneshot::channel();

        {
            let mut correlation = self.inner.shared.correlation.lock();
            if self.inner.shared.closed.load(Ordering::Acquire) {
                return ResponseFuture::failed(Error::SessionClosed);
            }
            correlation.insert(id, tx);
        }

        if self
            .inner
            .command_tx
            .send(LoopCommand::Send { id, text })
            .is_err()
        {
            self.inner.shared.correlation.lock().remove(&id);
            return ResponseFuture::failed(Error::SessionClosed);
        }

        debug!(id = %id, method = %request.method, "Command issued");
        ResponseFuture::waiting(id, rx)
    }

    // ========================================================================
    // Domain State
    // ========================================================================

    /// Enables a domain.
    ///
    /// Idempotent: enabling an enabled domain does not issue a command.
    /// Concurrent calls for the same domain issue at most one command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the `enable` command; the domain stays disabled.
    pub async fn enable_domain(&self, domain: Domain) -> Result<()> {
        let mut enabled = self.inner.enabled.lock().await;
        if enabled.contains(&domain) {
            trace!(%domain, "Domain already enabled");
            return Ok(());
        }

        self.send(domain, "enable", Value::Null).await?;
        enabled.insert(domain);
        debug!(%domain, "Domain enabled");
        Ok(())
    }

    /// Disables a domain.
    ///
    /// Idempotent: disabling a disabled domain does not issue a command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the `disable` command; the domain stays enabled.
    pub async fn disable_domain(&self, domain: Domain) -> Result<()> {
        let mut enabled = self.inner.enabled.lock().await;
        if !enabled.contains(&domain) {
            trace!(%domain, "Domain already disabled");
            return Ok(());
        }

        self.send(domain, "disable", Value::Null).await?;
        enabled.remove(&domain);
        debug!(%domain, "Domain disabled");
        Ok(())
    }

    /// Returns `true` if the domain is enabled on this session.
    pub async fn is_enabled(&self, domain: Domain) -> bool {
        self.inner.enabled.lock().await.contains(&domain)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Registers an event handler for a `Domain.event` name.
    ///
    /// Handlers for one event run in registration order on the event loop.
    /// A `once` handler is unregistered before it runs.
    pub fn subscribe<F>(&self, method: &str, handler: F, once: bool) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        let registry = &self.inner.shared.subscriptions;

        let mut guard = registry.lock();
        if self.is_closed() {
            debug!(method, "Subscription refused: session closed");
            return Subscription::detached(method.to_string());
        }
        let id = guard.add_callback(method, handler, once);
        drop(guard);

        Subscription::new(id, method.to_string(), registry)
    }

    /// Returns a future resolving with the next occurrence of an event.
    ///
    /// The subscription is registered immediately, so an event that arrives
    /// before the future is first awaited is still observed.
    pub fn wait_for(&self, method: &str) -> EventWaiter {
        let registry = &self.inner.shared.subscriptions;
        let (tx, rx) = oneshot::channel();

        let mut guard = registry.lock();
        if self.is_closed() {
            return EventWaiter::closed();
        }
        let id = guard.add_waiter(method, tx);
        drop(guard);

        EventWaiter::new(rx, Subscription::new(id, method.to_string(), registry))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Returns the endpoint description.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the number of pending commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.shared.correlation.lock().len()
    }

    /// Returns the number of live subscriptions for an event.
    #[must_use]
    pub fn subscription_count(&self, method: &str) -> usize {
        self.inner.shared.subscriptions.lock().count(method)
    }

    /// Returns `true` once teardown has started.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.shared.closed.load(Ordering::Acquire)
    }

    /// Resolves once the session has been torn down.
    pub async fn closed(&self) {
        let notified = self.inner.shared.closed_notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Returns the protocol violations recorded so far.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        self.inner.shared.violations.lock().clone()
    }

    /// Takes the recorded protocol violations, leaving none behind.
    #[must_use]
    pub fn take_violations(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.shared.violations.lock())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Closes the session.
    ///
    /// Every pending command fails with [`Error::SessionClosed`], every
    /// subscription is dropped and the transport is closed. Waits for the
    /// event loop to finish. Calling it again is a no-op.
    pub async fn close(&self) {
        let _ = self.inner.command_tx.send(LoopCommand::Shutdown);

        let handle = self.inner.event_loop.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Event loop task failed");
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Event loop that owns the transport halves.
async fn run_event_loop(
    label: String,
    mut sink: FrameSink,
    mut stream: FrameStream,
    mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
    shared: Arc<Shared>,
) {
    loop {
        tokio::select! {
            // Frames from the remote end
            frame = stream.next() => {
                match frame {
                    Some(Ok(text)) => handle_incoming(&text, &shared),

                    Some(Err(Error::ConnectionClosed)) => {
                        debug!(label = %label, "Transport closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        warn!(label = %label, error = %e, "Transport error");
                        break;
                    }

                    None => {
                        debug!(label = %label, "Transport stream ended");
                        break;
                    }
                }
            }

            // Commands from the API
            command = command_rx.recv() => {
                match command {
                    Some(LoopCommand::Send { id, text }) => {
                        trace!(id = %id, frame = %text, "Writing frame");
                        if let Err(e) = sink.send(text).await
                            && let Some(tx) = shared.correlation.lock().remove(&id)
                        {
                            let _ = tx.send(Err(Error::connection(e.to_string())));
                        }
                    }

                    Some(LoopCommand::Shutdown) => {
                        debug!(label = %label, "Shutdown requested");
                        let _ = sink.close().await;
                        break;
                    }

                    None => {
                        debug!(label = %label, "All session handles dropped");
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
        }
    }

    teardown(&shared);
    info!(label = %label, "Protocol session closed");
}

/// Routes one inbound frame.
fn handle_incoming(text: &str, shared: &Shared) {
    trace!(frame = %text, "Frame received");

    match Incoming::parse(text) {
        Ok(Incoming::Response(response)) => {
            let id = response.id;
            let tx = shared.correlation.lock().remove(&id);
            match tx {
                Some(tx) => {
                    let _ = tx.send(response.into_result());
                }
                None => {
                    shared.record_violation(format!("response for unknown or settled command id {id}"));
                }
            }
        }

        Ok(Incoming::MalformedResponse { id, reason }) => {
            let message = format!("malformed response for command id {id}: {reason}");
            let tx = shared.correlation.lock().remove(&id);
            if let Some(tx) = tx {
                let _ = tx.send(Err(Error::protocol_violation(message.clone())));
            }
            shared.record_violation(message);
        }

        Ok(Incoming::Event(event)) => {
            let delivered = dispatch(&shared.subscriptions, &event);
            trace!(method = %event.method, delivered, "Event dispatched");
        }

        Err(e) => {
            shared.record_violation(format!("unparseable frame: {e}"));
        }
    }
}

/// Fails all pending commands and drops all subscriptions.
fn teardown(shared: &Shared) {
    let pending: Vec<_> = {
        let mut correlation = shared.correlation.lock();
        shared.closed.store(true, Ordering::Release);
        correlation.drain().collect()
    };

    let count = pending.len();
    for (_, tx) in pending {
        let _ = tx.send(Err(Error::SessionClosed));
    }

    if count > 0 {
        debug!(count, "Failed pending commands on teardown");
    }

    shared.subscriptions.lock().clear();
    shared.closed_notify.notify_waiters();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use crate::transport::MemoryRemote;

    fn session() -> (ProtocolSession, MemoryRemote) {
        let (channel, remote) = TransportChannel::memory();
        (ProtocolSession::new(channel), remote)
    }

    #[tokio::test]
    async fn test_send_resolves_with_result() {
        let (session, mut remote) = session();

        let future = session.send(Domain::Runtime, "evaluate", json!({ "expression": "1+1" }));
        let command = remote.next_command().await.expect("command");
        assert_eq!(command.method, "Runtime.evaluate");
        assert_eq!(command.params["expression"], "1+1");
        assert_eq!(Some(command.id), future.id());

        remote.respond(command.id, json!({ "result": { "type": "number", "value": 2 } }));
        let result = future.await.expect("result");
        assert_eq!(result["result"]["value"], 2);
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let (session, mut remote) = session();

        let _a = session.send(Domain::Page, "enable", Value::Null);
        let _b = session.send(Domain::Page, "reload", Value::Null);

        assert_eq!(remote.next_command().await.expect("a").id, CommandId::new(1));
        assert_eq!(remote.next_command().await.expect("b").id, CommandId::new(2));
    }

    #[tokio::test]
    async fn test_remote_error_is_surfaced() {
        let (session, mut remote) = session();

        let future = session.send(Domain::Page, "navigate", json!({ "url": "about:blank" }));
        let command = remote.next_command().await.expect("command");
        remote.respond_error(command.id, -32000, "Cannot navigate");

        let err = future.await.expect_err("remote error");
        assert!(matches!(err, Error::Remote { code: -32000, ref message } if message == "Cannot navigate"));
    }

    #[tokio::test]
    async fn test_out_of_order_responses_correlate_by_id() {
        let (session, mut remote) = session();

        let first = session.send(Domain::Runtime, "evaluate", json!({ "expression": "'a'" }));
        let second = session.send(Domain::Runtime, "evaluate", json!({ "expression": "'b'" }));

        let c1 = remote.next_command().await.expect("c1");
        let c2 = remote.next_command().await.expect("c2");

        remote.respond(c2.id, json!({ "tag": "b" }));
        remote.respond(c1.id, json!({ "tag": "a" }));

        assert_eq!(second.await.expect("second")["tag"], "b");
        assert_eq!(first.await.expect("first")["tag"], "a");
    }

    #[tokio::test]
    async fn test_unknown_response_id_is_recorded_as_violation() {
        let (session, remote) = session();

        let waiter = session.wait_for("Inspector.detached");
        remote.respond(CommandId::new(99), json!({}));
        remote.emit("Inspector.detached", json!({ "reason": "test" }));

        // The event is dispatched after the stray response has been handled.
        waiter.await.expect("event");
        let violations = session.violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("99"));

        assert_eq!(session.take_violations().len(), 1);
        assert!(session.violations().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_response_is_violation() {
        let (session, mut remote) = session();

        let future = session.send(Domain::Page, "enable", Value::Null);
        let command = remote.next_command().await.expect("command");
        remote.respond(command.id, json!({}));
        future.await.expect("first response");

        let waiter = session.wait_for("Page.frameNavigated");
        remote.respond(command.id, json!({}));
        remote.emit("Page.frameNavigated", json!({}));
        waiter.await.expect("event");

        assert_eq!(session.violations().len(), 1);
    }

    #[tokio::test]
    async fn test_close_fails_pending_commands() {
        let (session, mut remote) = session();

        let futures: Vec<_> = (0..3)
            .map(|_| session.send(Domain::Runtime, "evaluate", json!({ "expression": "0" })))
            .collect();
        for _ in 0..3 {
            remote.next_command().await.expect("command");
        }

        session.close().await;

        for future in futures {
            assert!(future.await.expect_err("closed").is_session_closed());
        }
        assert!(session.is_closed());
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_send_after_close_fails_immediately() {
        let (session, _remote) = session();
        session.close().await;

        let err = session
            .send(Domain::Page, "enable", Value::Null)
            .await
            .expect_err("closed");
        assert!(err.is_session_closed());
        assert!(session.wait_for("Page.loadEventFired").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_end_fails_pending_and_waiters() {
        let (session, mut remote) = session();

        let future = session.send(Domain::Page, "enable", Value::Null);
        let waiter = session.wait_for("Page.loadEventFired");
        remote.next_command().await.expect("command");
        remote.hang_up();

        assert!(future.await.expect_err("closed").is_session_closed());
        assert!(matches!(waiter.await, Err(Error::SessionClosed)));
    }

    #[tokio::test]
    async fn test_closed_resolves_after_hang_up() {
        let (session, mut remote) = session();

        let watcher = tokio::spawn({
            let session = session.clone();
            async move { session.closed().await }
        });
        remote.hang_up();

        watcher.await.expect("join");
        assert!(session.is_closed());
        session.closed().await;
    }

    #[tokio::test]
    async fn test_enable_domain_is_idempotent() {
        let (session, mut remote) = session();

        let enabling = tokio::spawn({
            let session = session.clone();
            async move { session.enable_domain(Domain::Network).await }
        });
        let command = remote.next_command().await.expect("enable");
        assert_eq!(command.method, "Network.enable");
        remote.respond(command.id, json!({}));
        enabling.await.expect("join").expect("enable");

        session.enable_domain(Domain::Network).await.expect("second enable");
        assert!(session.is_enabled(Domain::Network).await);
        assert!(remote.try_next_command().is_none());
    }

    #[tokio::test]
    async fn test_failed_enable_leaves_domain_disabled() {
        let (session, mut remote) = session();

        let enabling = tokio::spawn({
            let session = session.clone();
            async move { session.enable_domain(Domain::Css).await }
        });
        let command = remote.next_command().await.expect("enable");
        remote.respond_error(command.id, -32601, "CSS agent not available");

        assert!(enabling.await.expect("join").is_err());
        assert!(!session.is_enabled(Domain::Css).await);
    }

    #[tokio::test]
    async fn test_send_method_rejects_malformed_name() {
        let (session, _remote) = session();

        let err = session
            .send_method("evaluate", Value::Null)
            .await
            .expect_err("malformed");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_events_dispatch_in_arrival_order() {
        let (session, remote) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let once_hits = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&seen);
        session.subscribe(
            "Network.loadingFinished",
            move |event| sink.lock().push(event.get_str("requestId").to_string()),
            false,
        );
        let counter = Arc::clone(&once_hits);
        session.subscribe(
            "Network.loadingFinished",
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            true,
        );

        let done = session.wait_for("Page.loadEventFired");
        remote.emit("Network.loadingFinished", json!({ "requestId": "r1" }));
        remote.emit("Network.loadingFinished", json!({ "requestId": "r2" }));
        remote.emit("Page.loadEventFired", json!({}));
        done.await.expect("marker event");

        assert_eq!(*seen.lock(), vec!["r1".to_string(), "r2".to_string()]);
        assert_eq!(once_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_violation_and_loop_continues() {
        let (session, remote) = session();

        let waiter = session.wait_for("Log.entryAdded");
        remote.send_raw("not json");
        remote.emit("Log.entryAdded", json!({ "entry": {} }));

        waiter.await.expect("loop still running");
        assert_eq!(session.violations().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_error_body_fails_the_pending_command() {
        let (session, mut remote) = session();

        let navigating = session.send(Domain::Page, "navigate", json!({ "url": "http://test/" }));
        let command = remote.next_command().await.expect("navigate");
        remote.send_raw(format!(r#"{{"id":{},"error":{{"message":"boom"}}}}"#, command.id));

        let err = navigating.await.expect_err("malformed response");
        assert!(err.is_protocol_violation());
        assert_eq!(session.pending_count(), 0);

        let violations = session.violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains(&format!("command id {}", command.id)));
    }

    #[tokio::test]
    async fn test_subscriptions_are_counted_until_cancelled_or_closed() {
        let (session, _remote) = session();

        let first = session.subscribe("Network.loadingFinished", |_| {}, false);
        let _second = session.subscribe("Network.loadingFinished", |_| {}, true);
        assert_eq!(session.subscription_count("Network.loadingFinished"), 2);

        assert!(first.cancel());
        assert!(!first.cancel());
        assert_eq!(session.subscription_count("Network.loadingFinished"), 1);

        session.close().await;
        assert_eq!(session.subscription_count("Network.loadingFinished"), 0);
    }
}
