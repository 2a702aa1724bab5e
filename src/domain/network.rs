//! Typed `Network` domain commands.

use serde_json::json;

use crate::error::Result;
use crate::protocol::{ContinueInterceptedRequestParams, Event, RequestPattern};
use crate::session::{EventWaiter, Subscription};

use super::DomainHandle;

// ============================================================================
// NetworkDomain
// ============================================================================

/// Typed wrapper over the `Network` domain.
#[derive(Debug, Clone, Copy)]
pub struct NetworkDomain<'a> {
    handle: DomainHandle<'a>,
}

impl<'a> NetworkDomain<'a> {
    pub(crate) fn new(handle: DomainHandle<'a>) -> Self {
        Self { handle }
    }

    /// Enables the domain.
    ///
    /// # Errors
    ///
    /// Propagates the error of `Network.enable`.
    pub async fn enable(&self) -> Result<()> {
        self.handle.enable().await
    }

    /// `Network.setRequestInterception`. An empty slice turns interception off.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn set_request_interception(&self, patterns: &[RequestPattern]) -> Result<()> {
        self.handle
            .issue("setRequestInterception", json!({ "patterns": patterns }))
            .await?;
        Ok(())
    }

    /// `Network.continueInterceptedRequest`.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn continue_intercepted_request(
        &self,
        params: ContinueInterceptedRequestParams,
    ) -> Result<()> {
        self.handle
            .issue("continueInterceptedRequest", serde_json::to_value(params)?)
            .await?;
        Ok(())
    }

    /// `Network.setCacheDisabled`.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn set_cache_disabled(&self, disabled: bool) -> Result<()> {
        self.handle
            .issue("setCacheDisabled", json!({ "cacheDisabled": disabled }))
            .await?;
        Ok(())
    }

    /// Subscribes to `Network.requestIntercepted`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn on_request_intercepted<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handle.on("requestIntercepted", handler)
    }

    /// Subscribes to `Network.loadingFinished`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn on_loading_finished<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handle.on("loadingFinished", handler)
    }

    /// Waits for the next `Network.loadingFinished`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn once_loading_finished(&self) -> Result<EventWaiter> {
        self.handle.once("loadingFinished")
    }

    /// Waits for the next `Network.loadingFailed`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn once_loading_failed(&self) -> Result<EventWaiter> {
        self.handle.once("loadingFailed")
    }
}
