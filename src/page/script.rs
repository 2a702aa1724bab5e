//! Script evaluation methods.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::protocol::EvaluateParams;

use super::PageSession;

// ============================================================================
// PageSession - Script Evaluation
// ============================================================================

impl PageSession {
    /// Evaluates an expression and returns its value.
    ///
    /// # Errors
    ///
    /// - [`Error::EvaluationException`](crate::Error::EvaluationException) if the script throws
    /// - [`Error::Remote`](crate::Error::Remote) if the command is rejected
    ///
    /// # Example
    ///
    /// ```ignore
    /// let two = page.evaluate("1 + 1").await?;
    /// assert_eq!(two, 2);
    /// ```
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        debug!(target_id = ?self.inner.target_id, expression_len = expression.len(), "Evaluating");

        let result = self
            .inner
            .dp
            .runtime()
            .evaluate(EvaluateParams::by_value(expression))
            .await?;

        result.into_value()
    }

    /// Evaluates an expression and waits for the promise it returns to settle.
    ///
    /// Resolves with the fulfilled value, never with the pending promise. If
    /// the engine answers with a promise handle instead of awaiting it, the
    /// promise is awaited with `Runtime.awaitPromise`.
    ///
    /// # Errors
    ///
    /// - [`Error::EvaluationException`](crate::Error::EvaluationException) with the rejection reason
    /// - [`Error::Remote`](crate::Error::Remote) if a command is rejected
    pub async fn evaluate_async(&self, expression: &str) -> Result<Value> {
        debug!(target_id = ?self.inner.target_id, expression_len = expression.len(), "Evaluating async");

        let runtime = self.inner.dp.runtime();
        let result = runtime.evaluate(EvaluateParams::awaiting(expression)).await?;

        if result.exception_details.is_none()
            && result.result.is_promise()
            && let Some(object_id) = result.result.object_id.as_deref()
        {
            debug!(object_id, "Awaiting pending promise");
            return runtime.await_promise(object_id).await?.into_value();
        }

        result.into_value()
    }

    /// Replaces the document with literal markup.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate).
    pub async fn load_html(&self, markup: &str) -> Result<()> {
        debug!(target_id = ?self.inner.target_id, markup_len = markup.len(), "Loading markup");

        let script = format!(
            "document.open(); document.write({}); document.close();",
            json_string(markup)
        );
        self.evaluate(&script).await?;
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escapes a string as a JavaScript string literal.
pub(crate) fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::DomainProxy;
    use crate::error::Error;
    use crate::session::ProtocolSession;
    use crate::transport::{MemoryRemote, TransportChannel};

    use super::*;

    fn page() -> (PageSession, MemoryRemote) {
        let (channel, remote) = TransportChannel::memory();
        let page = PageSession::new(DomainProxy::new(ProtocolSession::new(channel)));
        (page, remote)
    }

    #[test]
    fn test_json_string_escapes_markup() {
        assert_eq!(json_string(r#"<p class="x">a</p>"#), r#""<p class=\"x\">a</p>""#);
        assert_eq!(json_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[tokio::test]
    async fn test_evaluate_returns_value() {
        let (page, mut remote) = page();
        let evaluating = tokio::spawn({
            let page = page.clone();
            async move { page.evaluate("1+1").await }
        });

        let command = remote.next_command().await.expect("evaluate");
        assert_eq!(command.method, "Runtime.evaluate");
        assert_eq!(command.params, json!({ "expression": "1+1", "returnByValue": true }));
        remote.respond(
            command.id,
            json!({ "result": { "type": "number", "value": 2, "description": "2" } }),
        );

        assert_eq!(evaluating.await.expect("join").expect("value"), json!(2));
    }

    #[tokio::test]
    async fn test_evaluate_exception() {
        let (page, mut remote) = page();
        let evaluating = tokio::spawn({
            let page = page.clone();
            async move { page.evaluate("missing()").await }
        });

        let command = remote.next_command().await.expect("evaluate");
        remote.respond(
            command.id,
            json!({
                "result": { "type": "object", "subtype": "error" },
                "exceptionDetails": {
                    "text": "Uncaught",
                    "exception": {
                        "type": "object",
                        "subtype": "error",
                        "description": "ReferenceError: missing is not defined"
                    }
                }
            }),
        );

        let err = evaluating.await.expect("join").expect_err("exception");
        assert!(matches!(
            err,
            Error::EvaluationException { ref description }
                if description == "ReferenceError: missing is not defined"
        ));
    }

    #[tokio::test]
    async fn test_evaluate_async_resolves_settled_value() {
        let (page, mut remote) = page();
        let evaluating = tokio::spawn({
            let page = page.clone();
            async move { page.evaluate_async("new Promise(r => setTimeout(() => r('ok'), 10))").await }
        });

        let command = remote.next_command().await.expect("evaluate");
        assert_eq!(command.params["awaitPromise"], true);
        remote.respond(command.id, json!({ "result": { "type": "string", "value": "ok" } }));

        assert_eq!(evaluating.await.expect("join").expect("value"), json!("ok"));
    }

    #[tokio::test]
    async fn test_evaluate_async_follows_up_on_pending_promise() {
        let (page, mut remote) = page();
        let evaluating = tokio::spawn({
            let page = page.clone();
            async move { page.evaluate_async("later()").await }
        });

        let command = remote.next_command().await.expect("evaluate");
        remote.respond(
            command.id,
            json!({ "result": { "type": "object", "subtype": "promise", "objectId": "P1" } }),
        );

        let follow_up = remote.next_command().await.expect("awaitPromise");
        assert_eq!(follow_up.method, "Runtime.awaitPromise");
        assert_eq!(follow_up.params["promiseObjectId"], "P1");
        remote.respond(follow_up.id, json!({ "result": { "type": "string", "value": "ok" } }));

        assert_eq!(evaluating.await.expect("join").expect("value"), json!("ok"));
    }

    #[tokio::test]
    async fn test_evaluate_async_rejection() {
        let (page, mut remote) = page();
        let evaluating = tokio::spawn({
            let page = page.clone();
            async move { page.evaluate_async("Promise.reject('nope')").await }
        });

        let command = remote.next_command().await.expect("evaluate");
        remote.respond(
            command.id,
            json!({
                "result": { "type": "string", "value": "nope" },
                "exceptionDetails": {
                    "text": "Uncaught (in promise)",
                    "exception": { "type": "string", "value": "nope" }
                }
            }),
        );

        let err = evaluating.await.expect("join").expect_err("rejected");
        assert!(matches!(err, Error::EvaluationException { ref description } if description == "nope"));
    }
}
