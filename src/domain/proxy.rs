//! Domain proxy and per-domain handles.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::protocol::schema::{check_command, check_event, lookup};
use crate::protocol::{Domain, Event, MemberKind, SchemaPolicy};
use crate::session::{EventWaiter, ProtocolSession, ResponseFuture, Subscription};

use super::{NetworkDomain, PageDomain, RuntimeDomain, TargetDomain};

// ============================================================================
// DomainProxy
// ============================================================================

/// Façade exposing commands and events grouped by domain.
///
/// Holds no state beyond the session handle and the schema policy; every call
/// forwards to the [`ProtocolSession`] and errors propagate unchanged.
///
/// # Example
///
/// ```ignore
/// let dp = DomainProxy::new(session.clone());
///
/// dp.domain(Domain::Network).enable().await?;
/// let finished = dp.domain(Domain::Network).once("loadingFinished")?;
/// dp.domain(Domain::Page).invoke("reload", json!({})).await?;
/// finished.await?;
/// ```
#[derive(Debug, Clone)]
pub struct DomainProxy {
    session: ProtocolSession,
    policy: SchemaPolicy,
}

impl DomainProxy {
    /// Creates a permissive proxy over a session.
    #[must_use]
    pub fn new(session: ProtocolSession) -> Self {
        Self::with_policy(session, SchemaPolicy::default())
    }

    /// Creates a proxy with an explicit schema policy.
    #[must_use]
    pub fn with_policy(session: ProtocolSession, policy: SchemaPolicy) -> Self {
        Self { session, policy }
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &ProtocolSession {
        &self.session
    }

    /// Returns the schema policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> SchemaPolicy {
        self.policy
    }

    /// Returns the handle for a domain.
    #[inline]
    #[must_use]
    pub fn domain(&self, domain: Domain) -> DomainHandle<'_> {
        DomainHandle {
            proxy: self,
            domain,
        }
    }

    /// Typed `Runtime` commands.
    #[must_use]
    pub fn runtime(&self) -> RuntimeDomain<'_> {
        RuntimeDomain::new(self.domain(Domain::Runtime))
    }

    /// Typed `Page` commands.
    #[must_use]
    pub fn page(&self) -> PageDomain<'_> {
        PageDomain::new(self.domain(Domain::Page))
    }

    /// Typed `Network` commands.
    #[must_use]
    pub fn network(&self) -> NetworkDomain<'_> {
        NetworkDomain::new(self.domain(Domain::Network))
    }

    /// Typed `Target` commands.
    #[must_use]
    pub fn target(&self) -> TargetDomain<'_> {
        TargetDomain::new(self.domain(Domain::Target))
    }
}

// ============================================================================
// DomainHandle
// ============================================================================

/// Commands and events of one domain.
#[derive(Debug, Clone, Copy)]
pub struct DomainHandle<'a> {
    proxy: &'a DomainProxy,
    domain: Domain,
}

impl<'a> DomainHandle<'a> {
    /// Returns the domain.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &'a ProtocolSession {
        &self.proxy.session
    }

    /// Issues a command immediately, without the enable/disable routing of
    /// [`invoke`](Self::invoke).
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::InvalidArgument`](crate::Error::InvalidArgument)
    /// or [`Error::UnknownMethod`](crate::Error::UnknownMethod) when the schema
    /// check rejects the call; otherwise as [`ProtocolSession::send`].
    pub fn issue(&self, method: &str, params: Value) -> ResponseFuture {
        if let Err(e) = self.check_command(method, &params) {
            return ResponseFuture::failed(e);
        }
        self.proxy.session.send(self.domain, method, params)
    }

    /// Invokes a command and waits for its result.
    ///
    /// `enable` and `disable` go through the session's idempotent domain
    /// state and resolve with an empty object.
    ///
    /// # Errors
    ///
    /// Schema errors, then whatever the session reports.
    pub async fn invoke(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "enable" => self.enable().await.map(|()| json!({})),
            "disable" => self.disable().await.map(|()| json!({})),
            _ => self.issue(method, params).await,
        }
    }

    /// Enables the domain (idempotent).
    ///
    /// # Errors
    ///
    /// Propagates the error of the `enable` command.
    pub async fn enable(&self) -> Result<()> {
        self.proxy.session.enable_domain(self.domain).await
    }

    /// Disables the domain (idempotent).
    ///
    /// # Errors
    ///
    /// Propagates the error of the `disable` command.
    pub async fn disable(&self) -> Result<()> {
        self.proxy.session.disable_domain(self.domain).await
    }

    /// Subscribes a persistent handler to an event of this domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMethod`](crate::Error::UnknownMethod) for an
    /// unknown event under a strict policy.
    pub fn on<F>(&self, event: &str, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.check_event(event)?;
        Ok(self
            .proxy
            .session
            .subscribe(&self.domain.qualify(event), handler, false))
    }

    /// Subscribes a handler that runs for the next occurrence only.
    ///
    /// # Errors
    ///
    /// As [`on`](Self::on).
    pub fn once_with<F>(&self, event: &str, handler: F) -> Result<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.check_event(event)?;
        Ok(self
            .proxy
            .session
            .subscribe(&self.domain.qualify(event), handler, true))
    }

    /// Returns a future for the next occurrence of an event.
    ///
    /// # Errors
    ///
    /// As [`on`](Self::on).
    pub fn once(&self, event: &str) -> Result<EventWaiter> {
        self.check_event(event)?;
        Ok(self.proxy.session.wait_for(&self.domain.qualify(event)))
    }

    fn check_command(&self, method: &str, params: &Value) -> Result<()> {
        check_command(self.domain, method, params, self.proxy.policy)?;
        if lookup(self.domain, method, MemberKind::Command).is_none() {
            debug!(method = %self.domain.qualify(method), "Forwarding command not in schema");
        }
        Ok(())
    }

    fn check_event(&self, event: &str) -> Result<()> {
        check_event(self.domain, event, self.proxy.policy)?;
        if lookup(self.domain, event, MemberKind::Event).is_none() {
            debug!(event = %self.domain.qualify(event), "Subscribing to event not in schema");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::transport::TransportChannel;

    #[tokio::test]
    async fn test_invoke_forwards_to_session() {
        let (channel, mut remote) = TransportChannel::memory();
        let dp = DomainProxy::new(ProtocolSession::new(channel));

        let pending = dp.domain(Domain::Dom).issue("getDocument", json!({ "depth": 1 }));
        let command = remote.next_command().await.expect("command");
        assert_eq!(command.method, "DOM.getDocument");
        assert_eq!(command.params, json!({ "depth": 1 }));

        remote.respond(command.id, json!({ "root": { "nodeId": 1 } }));
        assert_eq!(pending.await.expect("result")["root"]["nodeId"], 1);
    }

    #[tokio::test]
    async fn test_missing_required_param_is_rejected_locally() {
        let (channel, mut remote) = TransportChannel::memory();
        let dp = DomainProxy::new(ProtocolSession::new(channel));

        let err = dp
            .domain(Domain::Runtime)
            .invoke("evaluate", json!({}))
            .await
            .expect_err("missing expression");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(remote.try_next_command().is_none());
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_unknown_members() {
        let (channel, _remote) = TransportChannel::memory();
        let dp = DomainProxy::with_policy(ProtocolSession::new(channel), SchemaPolicy::Strict);

        let err = dp
            .domain(Domain::Page)
            .invoke("doesNotExist", json!({}))
            .await
            .expect_err("unknown command");
        assert!(matches!(err, Error::UnknownMethod { ref method } if method == "Page.doesNotExist"));

        let err = dp
            .domain(Domain::Page)
            .on("neverFired", |_| {})
            .expect_err("unknown event");
        assert!(matches!(err, Error::UnknownMethod { .. }));
    }

    #[tokio::test]
    async fn test_permissive_policy_forwards_unknown_members() {
        let (channel, mut remote) = TransportChannel::memory();
        let dp = DomainProxy::new(ProtocolSession::new(channel));

        let _pending = dp.domain(Domain::Overlay).issue("highlightQuad", json!({}));
        let command = remote.next_command().await.expect("command");
        assert_eq!(command.method, "Overlay.highlightQuad");
        assert!(dp.domain(Domain::Overlay).on("screenshotRequested", |_| {}).is_ok());
    }

    #[tokio::test]
    async fn test_invoke_enable_twice_sends_one_command() {
        let (channel, mut remote) = TransportChannel::memory();
        let dp = DomainProxy::new(ProtocolSession::new(channel));

        let first = tokio::spawn({
            let dp = dp.clone();
            async move { dp.domain(Domain::Page).invoke("enable", Value::Null).await }
        });
        let command = remote.next_command().await.expect("enable");
        assert_eq!(command.method, "Page.enable");
        remote.respond(command.id, json!({}));
        assert_eq!(first.await.expect("join").expect("enable"), json!({}));

        dp.domain(Domain::Page)
            .invoke("enable", Value::Null)
            .await
            .expect("second enable");
        assert!(remote.try_next_command().is_none());
    }

    #[tokio::test]
    async fn test_once_resolves_with_event() {
        let (channel, remote) = TransportChannel::memory();
        let dp = DomainProxy::new(ProtocolSession::new(channel));

        let waiter = dp.domain(Domain::Page).once("loadEventFired").expect("waiter");
        remote.emit("Page.loadEventFired", json!({ "timestamp": 1.5 }));

        let event = waiter.await.expect("event");
        assert_eq!(event.get_f64("timestamp"), 1.5);
    }
}
