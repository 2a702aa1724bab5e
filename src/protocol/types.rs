//! Typed payloads for the commands the crate issues itself.
//!
//! Only the fields the harness reads or writes are modelled; unknown fields
//! in responses are ignored.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Runtime
// ============================================================================

/// Parameters of `Runtime.evaluate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// Expression to evaluate.
    pub expression: String,

    /// Return the result serialized by value instead of as a handle.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub return_by_value: bool,

    /// Wait for a returned promise to settle before responding.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub await_promise: bool,

    /// Treat the evaluation as initiated by a user gesture.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub user_gesture: bool,

    /// Execution context to evaluate in (default: page main world).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<i64>,
}

impl EvaluateParams {
    /// Evaluation returning its value by value.
    #[must_use]
    pub fn by_value(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: true,
            ..Self::default()
        }
    }

    /// Evaluation that awaits promise settlement and returns by value.
    #[must_use]
    pub fn awaiting(expression: impl Into<String>) -> Self {
        Self {
            await_promise: true,
            ..Self::by_value(expression)
        }
    }
}

/// Mirror of a remote JavaScript value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type (`object`, `number`, `string`, `undefined`, ...).
    #[serde(rename = "type")]
    pub object_type: String,

    /// Object subtype hint (`promise`, `error`, `null`, ...).
    #[serde(default)]
    pub subtype: Option<String>,

    /// Constructor name for objects.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Value, when serialized by value.
    #[serde(default)]
    pub value: Option<Value>,

    /// String form of values JSON cannot carry (`NaN`, `-0`, `Infinity`, bigints).
    #[serde(default)]
    pub unserializable_value: Option<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Handle to the remote object.
    #[serde(default)]
    pub object_id: Option<String>,
}

impl RemoteObject {
    /// Returns `true` if this mirrors a promise object.
    #[inline]
    #[must_use]
    pub fn is_promise(&self) -> bool {
        self.subtype.as_deref() == Some("promise")
    }

    /// Converts the mirror into a JSON value.
    ///
    /// `undefined` becomes `null`; unserializable values are returned as
    /// their string form.
    #[must_use]
    pub fn into_value(self) -> Value {
        if let Some(value) = self.value {
            return value;
        }
        if let Some(unserializable) = self.unserializable_value {
            return Value::String(unserializable);
        }
        Value::Null
    }
}

/// Details of an exception thrown during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text (`Uncaught`, `Uncaught (in promise)`, ...).
    #[serde(default)]
    pub text: String,

    /// Line number of the throw site.
    #[serde(default)]
    pub line_number: i64,

    /// Column number of the throw site.
    #[serde(default)]
    pub column_number: i64,

    /// The thrown value.
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best description of the thrown value.
    ///
    /// Prefers the exception's description (the `Error` stack), then a
    /// by-value rejection reason, then the exception text.
    #[must_use]
    pub fn description(&self) -> String {
        if let Some(exception) = &self.exception {
            if let Some(description) = &exception.description {
                return description.clone();
            }
            match &exception.value {
                Some(Value::String(reason)) => return reason.clone(),
                Some(value) if !value.is_null() => return value.to_string(),
                _ => {}
            }
        }
        self.text.clone()
    }
}

/// Result of `Runtime.evaluate` and `Runtime.awaitPromise`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// Evaluation result.
    pub result: RemoteObject,

    /// Present if the evaluation threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl EvaluateResult {
    /// Converts the result into its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationException`] if the evaluation threw.
    pub fn into_value(self) -> Result<Value> {
        match self.exception_details {
            Some(details) => Err(Error::evaluation_exception(details.description())),
            None => Ok(self.result.into_value()),
        }
    }
}

// ============================================================================
// Page
// ============================================================================

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    /// Frame that navigated.
    #[serde(default)]
    pub frame_id: String,

    /// Loader of the new document; absent for same-document navigations.
    #[serde(default)]
    pub loader_id: Option<String>,

    /// Set when the navigation failed.
    #[serde(default)]
    pub error_text: Option<String>,
}

// ============================================================================
// Network
// ============================================================================

/// Stage at which a request is intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterceptionStage {
    /// Before the request is sent.
    Request,
    /// After response headers are received.
    HeadersReceived,
}

/// URL pattern selecting requests to intercept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// Wildcard URL pattern (`*` matches everything).
    pub url_pattern: String,

    /// Restrict to a resource type (`Document`, `Script`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Interception stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interception_stage: Option<InterceptionStage>,
}

impl RequestPattern {
    /// Pattern matching every request.
    #[must_use]
    pub fn catch_all() -> Self {
        Self::url("*")
    }

    /// Pattern matching a wildcard URL.
    #[must_use]
    pub fn url(pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: pattern.into(),
            resource_type: None,
            interception_stage: None,
        }
    }
}

/// Reason reported to the page when an intercepted request is failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorReason {
    /// Generic network failure.
    Failed,
    /// Request aborted by the client.
    Aborted,
    /// Request timed out.
    TimedOut,
    /// Access denied.
    AccessDenied,
    /// Connection closed.
    ConnectionClosed,
    /// Connection reset.
    ConnectionReset,
    /// Connection refused.
    ConnectionRefused,
    /// Connection aborted.
    ConnectionAborted,
    /// Connection failed.
    ConnectionFailed,
    /// Host name could not be resolved.
    NameNotResolved,
    /// Network unreachable.
    InternetDisconnected,
    /// Address unreachable.
    AddressUnreachable,
    /// Blocked by the client.
    BlockedByClient,
    /// Blocked by the response.
    BlockedByResponse,
}

impl ErrorReason {
    /// Returns the protocol string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "Failed",
            Self::Aborted => "Aborted",
            Self::TimedOut => "TimedOut",
            Self::AccessDenied => "AccessDenied",
            Self::ConnectionClosed => "ConnectionClosed",
            Self::ConnectionReset => "ConnectionReset",
            Self::ConnectionRefused => "ConnectionRefused",
            Self::ConnectionAborted => "ConnectionAborted",
            Self::ConnectionFailed => "ConnectionFailed",
            Self::NameNotResolved => "NameNotResolved",
            Self::InternetDisconnected => "InternetDisconnected",
            Self::AddressUnreachable => "AddressUnreachable",
            Self::BlockedByClient => "BlockedByClient",
            Self::BlockedByResponse => "BlockedByResponse",
        }
    }
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of `Network.continueInterceptedRequest`.
///
/// With neither `error_reason` nor `raw_response` the request continues
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueInterceptedRequestParams {
    /// Interception to resolve.
    pub interception_id: String,

    /// Fail the request with this reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<ErrorReason>,

    /// Base64-encoded raw HTTP response (status line, headers, body).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Request data carried by network events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// Request URL.
    #[serde(default)]
    pub url: String,

    /// HTTP method.
    #[serde(default)]
    pub method: String,

    /// Request headers.
    #[serde(default)]
    pub headers: serde_json::Map<String, Value>,

    /// Request body, if any.
    #[serde(default)]
    pub post_data: Option<String>,
}

/// Payload of `Network.requestIntercepted`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInterceptedParams {
    /// Interception id; repeats across redirects of the same request.
    pub interception_id: String,

    /// The paused request.
    #[serde(default)]
    pub request: NetworkRequest,

    /// Frame that issued the request.
    #[serde(default)]
    pub frame_id: String,

    /// Resource type (`Document`, `Script`, `Image`, ...).
    #[serde(default)]
    pub resource_type: String,

    /// Whether this is a navigation request.
    #[serde(default)]
    pub is_navigation_request: bool,

    /// Redirect target when the interception is for a redirect.
    #[serde(default)]
    pub redirect_url: Option<String>,

    /// Response status, set at the `HeadersReceived` stage.
    #[serde(default)]
    pub response_status_code: Option<u16>,
}

// ============================================================================
// Target
// ============================================================================

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    /// Id of the created target.
    pub target_id: String,
}

// ============================================================================
// Tests
// ============================================================================
