//! Navigation methods.

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::NavigateResult;

use super::PageSession;

// ============================================================================
// PageSession - Navigation
// ============================================================================

impl PageSession {
    /// Navigates to a URL and waits for the page to load.
    ///
    /// The load waiter is registered before `Page.navigate` is issued, so the
    /// load event may arrive before or after the acknowledgment. Resolves once
    /// both have been observed. A same-document navigation (no loader) does
    /// not fire a load event and resolves on the acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`Error::Navigation`] if the engine reports `errorText`
    /// - [`Error::Remote`] if the command is rejected
    /// - [`Error::SessionClosed`] if the session closes first
    ///
    /// # Example
    ///
    /// ```ignore
    /// page.navigate("https://example.com/").await?;
    /// ```
    pub async fn navigate(&self, url: &str) -> Result<NavigateResult> {
        debug!(target_id = ?self.inner.target_id, %url, "Navigating");

        let page = self.inner.dp.page();
        page.enable().await?;

        let load = page.once_load_event_fired()?;
        let result = page.navigate(url).await?;

        if let Some(reason) = result.error_text.as_deref().filter(|text| !text.is_empty()) {
            return Err(Error::navigation(url, reason));
        }

        if result.loader_id.is_none() {
            debug!(%url, "Same-document navigation");
            return Ok(result);
        }

        load.await?;

        debug!(%url, frame_id = %result.frame_id, "Navigation complete");
        Ok(result)
    }

    /// Reloads the page and waits for the load event.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn reload(&self) -> Result<()> {
        debug!(target_id = ?self.inner.target_id, "Reloading");

        let page = self.inner.dp.page();
        page.enable().await?;

        let load = page.once_load_event_fired()?;
        page.reload(false).await?;
        load.await?;

        Ok(())
    }

    /// Returns the current document URL.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate). Returns [`Error::ProtocolViolation`]
    /// if `location.href` is not a string.
    pub async fn current_url(&self) -> Result<String> {
        let value = self.evaluate("location.href").await?;
        match value {
            serde_json::Value::String(url) => Ok(url),
            other => Err(Error::protocol_violation(format!(
                "location.href evaluated to a non-string value: {other}"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
