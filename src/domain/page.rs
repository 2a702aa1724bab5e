//! Typed `Page` domain commands.

use serde_json::json;

use crate::error::Result;
use crate::protocol::{Event, NavigateResult};
use crate::session::{EventWaiter, Subscription};

use super::DomainHandle;

// ============================================================================
// PageDomain
// ============================================================================

/// Typed wrapper over the `Page` domain.
#[derive(Debug, Clone, Copy)]
pub struct PageDomain<'a> {
    handle: DomainHandle<'a>,
}

impl<'a> PageDomain<'a> {
    pub(crate) fn new(handle: DomainHandle<'a>) -> Self {
        Self { handle }
    }

    /// Enables the domain.
    ///
    /// # Errors
    ///
    /// Propagates the error of `Page.enable`.
    pub async fn enable(&self) -> Result<()> {
        self.handle.enable().await
    }

    /// `Page.navigate`. Resolves on the acknowledgment only.
    ///
    /// # Errors
    ///
    /// Remote or session errors. A navigation the engine refuses is reported
    /// through [`NavigateResult::error_text`].
    pub async fn navigate(&self, url: &str) -> Result<NavigateResult> {
        let value = self.handle.issue("navigate", json!({ "url": url })).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `Page.reload`.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn reload(&self, ignore_cache: bool) -> Result<()> {
        self.handle
            .issue("reload", json!({ "ignoreCache": ignore_cache }))
            .await?;
        Ok(())
    }

    /// Waits for the next `Page.loadEventFired`.
    ///
    /// # Errors
    ///
    /// Schema errors only; the waiter itself fails on session close.
    pub fn once_load_event_fired(&self) -> Result<EventWaiter> {
        self.handle.once("loadEventFired")
    }

    /// Waits for the next `Page.domContentEventFired`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn once_dom_content_event_fired(&self) -> Result<EventWaiter> {
        self.handle.once("domContentEventFired")
    }

    /// Subscribes to `Page.frameNavigated`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn on_frame_navigated<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handle.on("frameNavigated", handler)
    }
}
