//! Network interception types.
//!
//! Types describing an intercepted request and the decision taken for it.
//!
//! # Mock Responses
//!
//! ```ignore
//! use inspector_harness::MockResponse;
//!
//! let raw = MockResponse::new(200)
//!     .header("Content-Type", "text/plain")
//!     .body("intercepted")
//!     .to_bytes();
//! controller.mock_response(&request.interception_id, raw).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;

use crate::identifiers::InterceptionId;
use crate::protocol::{ContinueInterceptedRequestParams, ErrorReason, RequestInterceptedParams};

// ============================================================================
// ResolutionState
// ============================================================================

/// Resolution state of an intercepted request.
///
/// `Pending` moves to exactly one terminal state; terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    /// Paused, awaiting a decision.
    Pending,
    /// Continued unmodified.
    Continued,
    /// Answered with a mocked response.
    Mocked,
    /// Failed with an error reason.
    Failed,
}

impl ResolutionState {
    /// Returns `true` for every state except `Pending`.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Continued => "continued",
            Self::Mocked => "mocked",
            Self::Failed => "failed",
        })
    }
}

// ============================================================================
// InterceptedRequest
// ============================================================================

/// Data about an intercepted network request.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedRequest {
    /// Interception ID, used to resolve the request.
    pub interception_id: InterceptionId,

    /// Request URL.
    pub url: String,

    /// HTTP method (GET, POST, etc.).
    pub method: String,

    /// Request headers.
    pub headers: HashMap<String, String>,

    /// Request body, if any.
    pub post_data: Option<String>,

    /// Resource type (Document, Script, Image, etc.).
    pub resource_type: String,

    /// Frame where the request originated.
    pub frame_id: String,

    /// Whether this is a navigation request.
    pub is_navigation_request: bool,

    /// Redirect target when the interception is for a redirect.
    pub redirect_url: Option<String>,
}

impl From<RequestInterceptedParams> for InterceptedRequest {
    fn from(params: RequestInterceptedParams) -> Self {
        let headers = params
            .request
            .headers
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect();

        Self {
            interception_id: InterceptionId::new(params.interception_id),
            url: params.request.url,
            method: params.request.method,
            headers,
            post_data: params.request.post_data,
            resource_type: params.resource_type,
            frame_id: params.frame_id,
            is_navigation_request: params.is_navigation_request,
            redirect_url: params.redirect_url,
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Decision for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Let the request proceed.
    Continue,
    /// Answer with a raw HTTP response.
    Mock(Vec<u8>),
    /// Fail the request.
    Fail(ErrorReason),
}

impl Resolution {
    /// Terminal state this resolution moves to.
    pub(crate) fn state(&self) -> ResolutionState {
        match self {
            Self::Continue => ResolutionState::Continued,
            Self::Mock(_) => ResolutionState::Mocked,
            Self::Fail(_) => ResolutionState::Failed,
        }
    }

    /// Builds the continuation command parameters.
    pub(crate) fn into_params(self, id: &InterceptionId) -> ContinueInterceptedRequestParams {
        let (error_reason, raw_response) = match self {
            Self::Continue => (None, None),
            Self::Mock(raw) => (None, Some(Base64Standard.encode(raw))),
            Self::Fail(reason) => (Some(reason), None),
        };

        ContinueInterceptedRequestParams {
            interception_id: id.as_str().to_string(),
            error_reason,
            raw_response,
        }
    }
}

// ============================================================================
// MockResponse
// ============================================================================

/// Builder for a raw HTTP/1.1 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl MockResponse {
    /// Creates a response with a status code and its standard reason phrase.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: reason_phrase(status).to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes the status line, headers and body.
    ///
    /// A `Content-Length` header is added unless one was set.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason);
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if !self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_terminal_states() {
        assert!(!ResolutionState::Pending.is_terminal());
        assert!(ResolutionState::Continued.is_terminal());
        assert!(ResolutionState::Mocked.is_terminal());
        assert!(ResolutionState::Failed.is_terminal());
    }

    #[test]
    fn test_intercepted_request_from_params() {
        let params: RequestInterceptedParams = serde_json::from_value(json!({
            "interceptionId": "job-7",
            "request": {
                "url": "http://test/img.png",
                "method": "GET",
                "headers": { "Accept": "image/*", "X-Count": 3 }
            },
            "frameId": "F1",
            "resourceType": "Image",
            "isNavigationRequest": false
        }))
        .expect("params");

        let request = InterceptedRequest::from(params);
        assert_eq!(request.interception_id.as_str(), "job-7");
        assert_eq!(request.headers["Accept"], "image/*");
        assert_eq!(request.headers["X-Count"], "3");
        assert_eq!(request.resource_type, "Image");
    }

    #[test]
    fn test_resolution_params() {
        let id = InterceptionId::new("job-1");

        let params = Resolution::Continue.into_params(&id);
        assert!(params.error_reason.is_none() && params.raw_response.is_none());

        let params = Resolution::Fail(ErrorReason::Aborted).into_params(&id);
        assert_eq!(params.error_reason, Some(ErrorReason::Aborted));

        let params = Resolution::Mock(b"HTTP/1.1 204 No Content\r\n\r\n".to_vec()).into_params(&id);
        assert_eq!(
            params.raw_response.as_deref(),
            Some("SFRUUC8xLjEgMjA0IE5vIENvbnRlbnQNCg0K")
        );
    }

    #[test]
    fn test_mock_response_bytes() {
        let raw = MockResponse::new(404)
            .header("Content-Type", "text/plain")
            .body("gone")
            .to_bytes();
        assert_eq!(
            String::from_utf8(raw).expect("utf8"),
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\ngone"
        );
    }
}
