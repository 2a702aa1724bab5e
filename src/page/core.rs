//! Core PageSession struct and accessors.

use std::fmt;
use std::sync::Arc;

use crate::domain::DomainProxy;
use crate::identifiers::TargetId;
use crate::session::ProtocolSession;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a page session.
pub(crate) struct PageInner {
    /// Target the session is attached to, when known.
    pub target_id: Option<TargetId>,
    /// Domain proxy over the page's protocol session.
    pub dp: DomainProxy,
}

// ============================================================================
// PageSession
// ============================================================================

/// High-level operations on one page target.
///
/// Compound operations (navigation, evaluation) sequence several commands
/// and events and resolve once with a single logical result.
#[derive(Clone)]
pub struct PageSession {
    pub(crate) inner: Arc<PageInner>,
}

impl fmt::Debug for PageSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSession")
            .field("target_id", &self.inner.target_id)
            .field("session", self.inner.dp.session())
            .finish()
    }
}

impl PageSession {
    /// Wraps a domain proxy.
    #[must_use]
    pub fn new(dp: DomainProxy) -> Self {
        Self {
            inner: Arc::new(PageInner {
                target_id: None,
                dp,
            }),
        }
    }

    /// Wraps a domain proxy attached to a known target.
    #[must_use]
    pub fn for_target(target_id: TargetId, dp: DomainProxy) -> Self {
        Self {
            inner: Arc::new(PageInner {
                target_id: Some(target_id),
                dp,
            }),
        }
    }

    /// Returns the target id, if known.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> Option<&TargetId> {
        self.inner.target_id.as_ref()
    }

    /// Returns the domain proxy.
    #[inline]
    #[must_use]
    pub fn dp(&self) -> &DomainProxy {
        &self.inner.dp
    }

    /// Returns the protocol session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &ProtocolSession {
        self.inner.dp.session()
    }
}
