//! Target provisioning.
//!
//! A [`TargetProvider`] creates page targets and hands back a transport to
//! each. Two providers ship with the crate:
//!
//! | Provider | Targets |
//! |----------|---------|
//! | [`DevToolsTargets`] | Pages of a real browser, via `Target.createTarget` |
//! | [`MemoryTargets`] | In-memory targets scripted by the caller |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use crate::domain::DomainProxy;
use crate::error::{Error, Result};
use crate::identifiers::TargetId;
use crate::session::ProtocolSession;
use crate::transport::{MemoryRemote, TransportChannel};

// ============================================================================
// TargetInfo
// ============================================================================

/// A provisioned page target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Target id.
    pub id: TargetId,
    /// URL the target was opened at.
    pub url: String,
}

// ============================================================================
// TargetProvider
// ============================================================================

/// Creates and destroys page targets.
#[async_trait]
pub trait TargetProvider: Send + Sync {
    /// Opens a page at `url` and connects a transport to it.
    async fn open_target(&self, url: &str) -> Result<(TargetInfo, TransportChannel)>;

    /// Closes a page opened by [`open_target`](Self::open_target).
    async fn close_target(&self, target: &TargetInfo) -> Result<()>;
}

// ============================================================================
// DevToolsTargets
// ============================================================================

/// Targets of a browser reachable over the DevTools WebSocket protocol.
///
/// Holds a browser-level session for `Target.createTarget` and
/// `Target.closeTarget`; each page gets its own WebSocket at
/// `/devtools/page/<targetId>` on the same host.
pub struct DevToolsTargets {
    browser: DomainProxy,
    endpoint: Url,
}

impl fmt::Debug for DevToolsTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevToolsTargets")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl DevToolsTargets {
    /// Connects to a browser endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(endpoint: &Url) -> Result<Self> {
        let session = ProtocolSession::connect(endpoint.as_str()).await?;
        info!(endpoint = %endpoint, "Connected to browser");
        Ok(Self::with_session(endpoint.clone(), session))
    }

    /// Uses an existing browser-level session.
    #[must_use]
    pub fn with_session(endpoint: Url, session: ProtocolSession) -> Self {
        Self {
            browser: DomainProxy::new(session),
            endpoint,
        }
    }

    /// Returns the WebSocket URL of a page target.
    #[must_use]
    pub fn page_url(&self, target_id: &TargetId) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!("/devtools/page/{target_id}"));
        url.set_query(None);
        url
    }

    /// Closes the browser-level session.
    pub async fn close(&self) {
        self.browser.session().close().await;
    }
}

#[async_trait]
impl TargetProvider for DevToolsTargets {
    async fn open_target(&self, url: &str) -> Result<(TargetInfo, TransportChannel)> {
        let id = self.browser.target().create_target(url).await?;
        let page_url = self.page_url(&id);

        let channel = match TransportChannel::connect(page_url.as_str()).await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = self.browser.target().close_target(&id).await;
                return Err(e);
            }
        };

        debug!(target_id = %id, %url, "Target opened");
        Ok((
            TargetInfo {
                id,
                url: url.to_string(),
            },
            channel,
        ))
    }

    async fn close_target(&self, target: &TargetInfo) -> Result<()> {
        self.browser.target().close_target(&target.id).await?;
        debug!(target_id = %target.id, "Target closed");
        Ok(())
    }
}

// ============================================================================
// MemoryTargets
// ============================================================================

/// In-memory targets.
///
/// Every opened target is announced on the receiver returned by
/// [`MemoryTargets::new`] together with its [`MemoryRemote`], so the caller can
/// play the engine side.
#[derive(Debug)]
pub struct MemoryTargets {
    next_id: AtomicU64,
    announce: mpsc::UnboundedSender<(TargetInfo, MemoryRemote)>,
    closed: Mutex<Vec<TargetId>>,
}

impl MemoryTargets {
    /// Creates a provider and the receiver announcing its targets.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TargetInfo, MemoryRemote)>) {
        let (announce, rx) = mpsc::unbounded_channel();
        let provider = Self {
            next_id: AtomicU64::new(1),
            announce,
            closed: Mutex::new(Vec::new()),
        };
        (provider, rx)
    }

    /// Returns the targets closed so far.
    #[must_use]
    pub fn closed_targets(&self) -> Vec<TargetId> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl TargetProvider for MemoryTargets {
    async fn open_target(&self, url: &str) -> Result<(TargetInfo, TransportChannel)> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let info = TargetInfo {
            id: TargetId::new(format!("memory-{n}")),
            url: url.to_string(),
        };

        let (channel, remote) = TransportChannel::memory();
        self.announce
            .send((info.clone(), remote))
            .map_err(|_| Error::connection("memory target receiver dropped"))?;

        Ok((info, channel))
    }

    async fn close_target(&self, target: &TargetInfo) -> Result<()> {
        self.closed.lock().push(target.id.clone());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
