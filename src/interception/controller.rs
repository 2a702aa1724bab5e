//! Interception controller.
//!
//! Tracks every request paused by `Network.requestIntercepted` and resolves
//! each exactly once through `Network.continueInterceptedRequest`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::DomainProxy;
use crate::error::{Error, Result};
use crate::identifiers::InterceptionId;
use crate::protocol::{ErrorReason, Event, RequestInterceptedParams, RequestPattern};
use crate::session::Subscription;

use super::types::{InterceptedRequest, Resolution, ResolutionState};

// ============================================================================
// Types
// ============================================================================

/// One tracked interception.
struct Entry {
    request: InterceptedRequest,
    state: ResolutionState,
}

/// Interception table shared with the event handler.
///
/// Holds no session handle, so the handler registered on the session does not
/// keep the session alive.
struct Table {
    entries: Mutex<FxHashMap<InterceptionId, Entry>>,
    queue_tx: mpsc::UnboundedSender<InterceptedRequest>,
    /// Malformed events and resolution misuse.
    violations: Mutex<Vec<String>>,
}

impl Table {
    /// Records an intercepted request and queues it for the test body.
    fn on_intercepted(&self, event: &Event) {
        let params: RequestInterceptedParams = match event.params_as() {
            Ok(params) => params,
            Err(e) => {
                let id = event.params.get("interceptionId").map_or_else(String::new, ToString::to_string);
                self.record_violation(format!(
                    "malformed Network.requestIntercepted (interceptionId {id}): {e}"
                ));
                return;
            }
        };

        let request = InterceptedRequest::from(params);
        let id = request.interception_id.clone();

        {
            let mut entries = self.entries.lock();
            if let Some(previous) = entries.get(&id)
                && previous.state.is_terminal()
            {
                debug!(interception_id = %id, previous = %previous.state, "Re-intercepted after resolution");
            }
            entries.insert(
                id.clone(),
                Entry {
                    request: request.clone(),
                    state: ResolutionState::Pending,
                },
            );
        }

        debug!(interception_id = %id, url = %request.url, "Request intercepted");
        let _ = self.queue_tx.send(request);
    }

    fn record_violation(&self, message: String) {
        warn!(violation = %message, "Interception violation");
        self.violations.lock().push(message);
    }
}

// ============================================================================
// InterceptionController
// ============================================================================

/// Exactly-once resolution of intercepted network requests.
///
/// Every matching fetch produces its own [`InterceptedRequest`]; there is no
/// limit on how many may be pending at once.
///
/// # Example
///
/// ```ignore
/// let controller = InterceptionController::new(dp.clone());
/// controller.enable(&[RequestPattern::catch_all()]).await?;
///
/// let request = controller.next_request().await?;
/// controller.continue_request(&request.interception_id).await?;
/// ```
#[derive(Clone)]
pub struct InterceptionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    dp: DomainProxy,
    table: Arc<Table>,
    queue_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<InterceptedRequest>>,
    subscription: Mutex<Option<Subscription>>,
}

impl fmt::Debug for InterceptionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionController")
            .field("tracked", &self.inner.table.entries.lock().len())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl InterceptionController {
    /// Creates a controller over a domain proxy. Interception starts disabled.
    #[must_use]
    pub fn new(dp: DomainProxy) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ControllerInner {
                dp,
                table: Arc::new(Table {
                    entries: Mutex::new(FxHashMap::default()),
                    queue_tx,
                    violations: Mutex::new(Vec::new()),
                }),
                queue_rx: tokio::sync::Mutex::new(queue_rx),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Returns `true` while the event subscription is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    // ========================================================================
    // Enable / Disable
    // ========================================================================

    /// Starts intercepting requests matching `patterns`.
    ///
    /// Enables the `Network` domain, subscribes to
    /// `Network.requestIntercepted` and issues
    /// `Network.setRequestInterception`. Calling it again replaces the
    /// patterns.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn enable(&self, patterns: &[RequestPattern]) -> Result<()> {
        debug!(pattern_count = patterns.len(), "Enabling request interception");

        let network = self.inner.dp.network();
        network.enable().await?;

        if !self.is_enabled() {
            let table = Arc::clone(&self.inner.table);
            let subscription = network.on_request_intercepted(move |event| table.on_intercepted(event))?;
            let previous = self.inner.subscription.lock().replace(subscription);
            if let Some(previous) = previous {
                previous.cancel();
            }
        }

        if let Err(e) = network.set_request_interception(patterns).await {
            self.cancel_subscription();
            return Err(e);
        }

        Ok(())
    }

    /// Stops intercepting new requests.
    ///
    /// Already intercepted requests stay tracked and must still be resolved.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn disable(&self) -> Result<()> {
        debug!("Disabling request interception");
        self.cancel_subscription();
        self.inner.dp.network().set_request_interception(&[]).await
    }

    fn cancel_subscription(&self) {
        if let Some(subscription) = self.inner.subscription.lock().take() {
            subscription.cancel();
        }
    }

    // ========================================================================
    // Intercepted Requests
    // ========================================================================

    /// Waits for the next intercepted request, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] once the session has closed and no
    /// queued request remains.
    pub async fn next_request(&self) -> Result<InterceptedRequest> {
        let mut queue = self.inner.queue_rx.lock().await;
        let session = self.inner.dp.session();

        tokio::select! {
            biased;

            request = queue.recv() => request.ok_or(Error::SessionClosed),
            () = session.closed() => match queue.try_recv() {
                Ok(request) => Ok(request),
                Err(_) => Err(Error::SessionClosed),
            },
        }
    }

    /// Returns an intercepted request that is already queued, if any.
    pub fn try_next_request(&self) -> Option<InterceptedRequest> {
        self.inner.queue_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Returns the state of an interception.
    #[must_use]
    pub fn state(&self, id: &InterceptionId) -> Option<ResolutionState> {
        self.inner.table.entries.lock().get(id).map(|entry| entry.state)
    }

    /// Returns the tracked request for an interception.
    #[must_use]
    pub fn request(&self, id: &InterceptionId) -> Option<InterceptedRequest> {
        self.inner
            .table
            .entries
            .lock()
            .get(id)
            .map(|entry| entry.request.clone())
    }

    /// Returns every request still awaiting a decision.
    #[must_use]
    pub fn unresolved(&self) -> Vec<InterceptedRequest> {
        let mut pending: Vec<_> = self
            .inner
            .table
            .entries
            .lock()
            .values()
            .filter(|entry| entry.state == ResolutionState::Pending)
            .map(|entry| entry.request.clone())
            .collect();
        pending.sort_by(|a, b| a.interception_id.as_str().cmp(b.interception_id.as_str()));
        pending
    }

    /// Returns the violations recorded so far: malformed interception events
    /// and repeated resolutions.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        self.inner.table.violations.lock().clone()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Lets an intercepted request proceed unmodified.
    ///
    /// # Errors
    ///
    /// - [`Error::InterceptNotFound`] for an unknown id
    /// - [`Error::ProtocolViolation`] if the request was already resolved
    /// - Remote or session errors; the request then stays `Pending`
    pub async fn continue_request(&self, id: &InterceptionId) -> Result<()> {
        self.resolve(id, Resolution::Continue).await
    }

    /// Answers an intercepted request with a raw HTTP response.
    ///
    /// `raw_response` is the full response: status line, headers, blank line
    /// and body. See [`MockResponse`](super::MockResponse).
    ///
    /// # Errors
    ///
    /// As [`continue_request`](Self::continue_request).
    pub async fn mock_response(&self, id: &InterceptionId, raw_response: impl Into<Vec<u8>>) -> Result<()> {
        self.resolve(id, Resolution::Mock(raw_response.into())).await
    }

    /// Fails an intercepted request.
    ///
    /// # Errors
    ///
    /// As [`continue_request`](Self::continue_request).
    pub async fn fail_request(&self, id: &InterceptionId, reason: ErrorReason) -> Result<()> {
        self.resolve(id, Resolution::Fail(reason)).await
    }

    async fn resolve(&self, id: &InterceptionId, resolution: Resolution) -> Result<()> {
        let target = resolution.state();

        {
            let mut entries = self.inner.table.entries.lock();
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| Error::intercept_not_found(id.as_str()))?;

            if entry.state.is_terminal() {
                let message = format!(
                    "interception {id} already {}; cannot mark it {target}",
                    entry.state
                );
                drop(entries);
                self.inner.table.record_violation(message.clone());
                return Err(Error::protocol_violation(message));
            }

            entry.state = target;
        }

        let params = resolution.into_params(id);
        if let Err(e) = self
            .inner
            .dp
            .network()
            .continue_intercepted_request(params)
            .await
        {
            if let Some(entry) = self.inner.table.entries.lock().get_mut(id)
                && entry.state == target
            {
                entry.state = ResolutionState::Pending;
            }
            debug!(interception_id = %id, error = %e, "Continuation rejected");
            return Err(e);
        }

        debug!(interception_id = %id, state = %target, "Interception resolved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
