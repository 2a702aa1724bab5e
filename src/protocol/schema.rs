//! Static protocol schema.
//!
//! A table of the commands and events this crate knows about, with the
//! parameters each command requires. The domain proxy consults it to catch
//! misspelled methods and missing parameters before a frame is sent.
//!
//! The table covers the methods the harness and typical inspector tests use;
//! it is not a full protocol description. Anything absent from it is still
//! reachable under [`SchemaPolicy::Permissive`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

use super::domain::Domain;

// ============================================================================
// Types
// ============================================================================

/// Whether a schema entry is a command or an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Request expecting one correlated response.
    Command,
    /// Notification pushed by the remote end.
    Event,
}

/// One row of the schema table.
#[derive(Debug, Clone, Copy)]
pub struct MemberSpec {
    /// Owning domain.
    pub domain: Domain,
    /// Member name (without domain prefix).
    pub name: &'static str,
    /// Command or event.
    pub kind: MemberKind,
    /// Parameters a command must carry.
    pub required: &'static [&'static str],
}

/// How the proxy treats members absent from the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Forward unknown members unchanged.
    #[default]
    Permissive,
    /// Reject unknown members with [`Error::UnknownMethod`].
    Strict,
}

const fn command(domain: Domain, name: &'static str, required: &'static [&'static str]) -> MemberSpec {
    MemberSpec {
        domain,
        name,
        kind: MemberKind::Command,
        required,
    }
}

const fn event(domain: Domain, name: &'static str) -> MemberSpec {
    MemberSpec {
        domain,
        name,
        kind: MemberKind::Event,
        required: &[],
    }
}

// ============================================================================
// Table
// ============================================================================

/// Known commands and events.
pub static SCHEMA: &[MemberSpec] = &[
    // Page
    command(Domain::Page, "enable", &[]),
    command(Domain::Page, "disable", &[]),
    command(Domain::Page, "navigate", &["url"]),
    command(Domain::Page, "reload", &[]),
    command(Domain::Page, "getFrameTree", &[]),
    command(Domain::Page, "setDocumentContent", &["frameId", "html"]),
    command(Domain::Page, "addScriptToEvaluateOnNewDocument", &["source"]),
    command(Domain::Page, "setLifecycleEventsEnabled", &["enabled"]),
    event(Domain::Page, "loadEventFired"),
    event(Domain::Page, "domContentEventFired"),
    event(Domain::Page, "frameNavigated"),
    event(Domain::Page, "frameStartedLoading"),
    event(Domain::Page, "frameStoppedLoading"),
    event(Domain::Page, "lifecycleEvent"),
    event(Domain::Page, "javascriptDialogOpening"),
    // Runtime
    command(Domain::Runtime, "enable", &[]),
    command(Domain::Runtime, "disable", &[]),
    command(Domain::Runtime, "evaluate", &["expression"]),
    command(Domain::Runtime, "awaitPromise", &["promiseObjectId"]),
    command(Domain::Runtime, "callFunctionOn", &["functionDeclaration"]),
    command(Domain::Runtime, "getProperties", &["objectId"]),
    command(Domain::Runtime, "releaseObject", &["objectId"]),
    command(Domain::Runtime, "runIfWaitingForDebugger", &[]),
    event(Domain::Runtime, "consoleAPICalled"),
    event(Domain::Runtime, "exceptionThrown"),
    event(Domain::Runtime, "executionContextCreated"),
    event(Domain::Runtime, "executionContextDestroyed"),
    event(Domain::Runtime, "executionContextsCleared"),
    // Network
    command(Domain::Network, "enable", &[]),
    command(Domain::Network, "disable", &[]),
    command(Domain::Network, "setRequestInterception", &["patterns"]),
    command(Domain::Network, "continueInterceptedRequest", &["interceptionId"]),
    command(Domain::Network, "getResponseBody", &["requestId"]),
    command(Domain::Network, "setCacheDisabled", &["cacheDisabled"]),
    command(Domain::Network, "setExtraHTTPHeaders", &["headers"]),
    command(Domain::Network, "setBlockedURLs", &["urls"]),
    command(Domain::Network, "clearBrowserCache", &[]),
    event(Domain::Network, "requestWillBeSent"),
    event(Domain::Network, "responseReceived"),
    event(Domain::Network, "dataReceived"),
    event(Domain::Network, "loadingFinished"),
    event(Domain::Network, "loadingFailed"),
    event(Domain::Network, "requestIntercepted"),
    event(Domain::Network, "requestServedFromCache"),
    // Fetch
    command(Domain::Fetch, "enable", &[]),
    command(Domain::Fetch, "disable", &[]),
    command(Domain::Fetch, "continueRequest", &["requestId"]),
    command(Domain::Fetch, "fulfillRequest", &["requestId", "responseCode"]),
    command(Domain::Fetch, "failRequest", &["requestId", "errorReason"]),
    event(Domain::Fetch, "requestPaused"),
    // DOM
    command(Domain::Dom, "enable", &[]),
    command(Domain::Dom, "disable", &[]),
    command(Domain::Dom, "getDocument", &[]),
    command(Domain::Dom, "querySelector", &["nodeId", "selector"]),
    command(Domain::Dom, "getOuterHTML", &[]),
    event(Domain::Dom, "documentUpdated"),
    event(Domain::Dom, "setChildNodes"),
    event(Domain::Dom, "attributeModified"),
    // CSS
    command(Domain::Css, "enable", &[]),
    command(Domain::Css, "disable", &[]),
    command(Domain::Css, "getComputedStyleForNode", &["nodeId"]),
    command(Domain::Css, "getMatchedStylesForNode", &["nodeId"]),
    command(Domain::Css, "getStyleSheetText", &["styleSheetId"]),
    command(Domain::Css, "setStyleSheetText", &["styleSheetId", "text"]),
    event(Domain::Css, "styleSheetAdded"),
    event(Domain::Css, "styleSheetRemoved"),
    event(Domain::Css, "styleSheetChanged"),
    // Target
    command(Domain::Target, "createTarget", &["url"]),
    command(Domain::Target, "closeTarget", &["targetId"]),
    command(Domain::Target, "getTargets", &[]),
    command(Domain::Target, "setDiscoverTargets", &["discover"]),
    event(Domain::Target, "targetCreated"),
    event(Domain::Target, "targetDestroyed"),
    event(Domain::Target, "targetInfoChanged"),
    // Emulation
    command(Domain::Emulation, "setDeviceMetricsOverride", &["width", "height", "deviceScaleFactor", "mobile"]),
    command(Domain::Emulation, "clearDeviceMetricsOverride", &[]),
    command(Domain::Emulation, "setEmulatedMedia", &[]),
    // Log
    command(Domain::Log, "enable", &[]),
    command(Domain::Log, "disable", &[]),
    event(Domain::Log, "entryAdded"),
    // Inspector
    event(Domain::Inspector, "detached"),
    event(Domain::Inspector, "targetCrashed"),
];

// ============================================================================
// Lookup & Validation
// ============================================================================

/// Finds the schema entry for a member.
#[must_use]
pub fn lookup(domain: Domain, name: &str, kind: MemberKind) -> Option<&'static MemberSpec> {
    SCHEMA
        .iter()
        .find(|spec| spec.domain == domain && spec.name == name && spec.kind == kind)
}

/// Validates a command invocation against the schema.
///
/// # Errors
///
/// - [`Error::UnknownMethod`] if the command is unknown and `policy` is strict
/// - [`Error::InvalidArgument`] if params are not an object or a required
///   parameter is missing
pub fn check_command(domain: Domain, name: &str, params: &Value, policy: SchemaPolicy) -> Result<()> {
    if !(params.is_object() || params.is_null()) {
        return Err(Error::invalid_argument(format!(
            "params of {} must be an object",
            domain.qualify(name)
        )));
    }

    let Some(spec) = lookup(domain, name, MemberKind::Command) else {
        return match policy {
            SchemaPolicy::Strict => Err(Error::unknown_method(domain.qualify(name))),
            SchemaPolicy::Permissive => Ok(()),
        };
    };

    for required in spec.required {
        if params.get(required).is_none() {
            return Err(Error::invalid_argument(format!(
                "{} requires parameter '{}'",
                domain.qualify(name),
                required
            )));
        }
    }

    Ok(())
}

/// Validates an event subscription against the schema.
///
/// # Errors
///
/// Returns [`Error::UnknownMethod`] if the event is unknown and `policy` is strict.
pub fn check_event(domain: Domain, name: &str, policy: SchemaPolicy) -> Result<()> {
    if policy == SchemaPolicy::Strict && lookup(domain, name, MemberKind::Event).is_none() {
        return Err(Error::unknown_method(domain.qualify(name)));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
