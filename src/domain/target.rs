//! Typed `Target` domain commands.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::identifiers::TargetId;
use crate::protocol::CreateTargetResult;

use super::DomainHandle;

// ============================================================================
// TargetDomain
// ============================================================================

/// Typed wrapper over the `Target` domain, used on browser-level sessions.
#[derive(Debug, Clone, Copy)]
pub struct TargetDomain<'a> {
    handle: DomainHandle<'a>,
}

impl<'a> TargetDomain<'a> {
    pub(crate) fn new(handle: DomainHandle<'a>) -> Self {
        Self { handle }
    }

    /// `Target.createTarget`: opens a page at `url`.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn create_target(&self, url: &str) -> Result<TargetId> {
        let value = self
            .handle
            .issue("createTarget", json!({ "url": url }))
            .await?;
        let result: CreateTargetResult = serde_json::from_value(value)?;
        debug!(target_id = %result.target_id, %url, "Target created");
        Ok(TargetId::new(result.target_id))
    }

    /// `Target.closeTarget`. Returns the engine's success flag.
    ///
    /// # Errors
    ///
    /// Remote or session errors.
    pub async fn close_target(&self, target_id: &TargetId) -> Result<bool> {
        let value = self
            .handle
            .issue("closeTarget", json!({ "targetId": target_id.as_str() }))
            .await?;
        Ok(value.get("success").and_then(serde_json::Value::as_bool).unwrap_or(true))
    }
}

// ============================================================================
// Tests
// ============================================================================
