//! Typed `Runtime` domain commands.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::protocol::{EvaluateParams, EvaluateResult, Event};
use crate::session::Subscription;

use super::DomainHandle;

// ============================================================================
// RuntimeDomain
// ============================================================================

/// Typed wrapper over the `Runtime` domain.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeDomain<'a> {
    handle: DomainHandle<'a>,
}

impl<'a> RuntimeDomain<'a> {
    pub(crate) fn new(handle: DomainHandle<'a>) -> Self {
        Self { handle }
    }

    /// Enables the domain.
    ///
    /// # Errors
    ///
    /// Propagates the error of `Runtime.enable`.
    pub async fn enable(&self) -> Result<()> {
        self.handle.enable().await
    }

    /// `Runtime.evaluate`.
    ///
    /// The raw result is returned; exceptions thrown by the script are in
    /// [`EvaluateResult::exception_details`], not an `Err`.
    ///
    /// # Errors
    ///
    /// Remote or session errors, or [`Error::Json`](crate::Error::Json) if the
    /// result does not parse.
    pub async fn evaluate(&self, params: EvaluateParams) -> Result<EvaluateResult> {
        debug!(expression = %params.expression, await_promise = params.await_promise, "Runtime.evaluate");
        let value = self.handle.issue("evaluate", serde_json::to_value(params)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `Runtime.awaitPromise` on a promise handle.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate).
    pub async fn await_promise(&self, promise_object_id: &str) -> Result<EvaluateResult> {
        debug!(object_id = promise_object_id, "Runtime.awaitPromise");
        let value = self
            .handle
            .issue(
                "awaitPromise",
                json!({ "promiseObjectId": promise_object_id, "returnByValue": true }),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `Runtime.releaseObject`.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn release_object(&self, object_id: &str) -> Result<()> {
        self.handle
            .issue("releaseObject", json!({ "objectId": object_id }))
            .await?;
        Ok(())
    }

    /// Subscribes to `Runtime.consoleAPICalled`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn on_console_api_called<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handle.on("consoleAPICalled", handler)
    }

    /// Subscribes to `Runtime.exceptionThrown`.
    ///
    /// # Errors
    ///
    /// Schema errors only.
    pub fn on_exception_thrown<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handle.on("exceptionThrown", handler)
    }

    /// Raw invocation escape hatch.
    ///
    /// # Errors
    ///
    /// As [`DomainHandle::invoke`].
    pub async fn invoke(&self, method: &str, params: Value) -> Result<Value> {
        self.handle.invoke(method, params).await
    }
}
