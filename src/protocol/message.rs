//! Wire message types.
//!
//! Defines the JSON frames exchanged with the remote engine.
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | [`Request`] | Local → Remote | `{ "id", "method", "params" }` |
//! | [`Response`] | Remote → Local | `{ "id", "result" }` or `{ "id", "error" }` |
//! | [`Event`] | Remote → Local | `{ "method", "params" }` |
//!
//! Inbound frames are classified by [`Incoming::parse`]: a frame carrying an
//! `id` is a response, a frame without one is an event. A frame whose `id`
//! reads but whose body does not is still routed to that command.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::domain::split_method;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// { "id": 1, "method": "Runtime.evaluate", "params": { "expression": "1+1" } }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Unique identifier for request/response correlation.
    pub id: CommandId,

    /// Command name in `Domain.command` format.
    pub method: String,

    /// Command parameters (always an object on the wire).
    pub params: Value,
}

impl Request {
    /// Creates a request, normalising `null` params to an empty object.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        let params = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params
        };
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Error body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    /// Protocol error code.
    pub code: i64,

    /// Human-readable message.
    pub message: String,

    /// Optional extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error body (if error).
    #[serde(default)]
    pub error: Option<RemoteErrorBody>,
}

impl Response {
    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// A success response without a `result` field yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response carries an `error` field.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::remote(error.code, error.message)),
            None => Ok(self.result.unwrap_or_else(|| Value::Object(Map::new()))),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// { "method": "Network.loadingFinished", "params": { "requestId": "1.2" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `Domain.event` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the domain name from the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Gets a string from params.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> &str {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Gets an optional string from params.
    #[inline]
    #[must_use]
    pub fn get_optional_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Gets a f64 from params.
    ///
    /// Returns 0.0 if key not found or not a number.
    #[inline]
    #[must_use]
    pub fn get_f64(&self, key: &str) -> f64 {
        self.params
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    /// Deserializes the params into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if params do not match `T`.
    pub fn params_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.params.clone())?)
    }
}

// ============================================================================
// Incoming
// ============================================================================

/// Raw inbound frame before classification.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<CommandId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RemoteErrorBody>,
}

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Frame carrying an `id`: a command response.
    Response(Response),
    /// Frame without an `id`: an event.
    Event(Event),
    /// Frame carrying a readable `id` whose body does not parse.
    MalformedResponse {
        /// Correlation id read from the frame.
        id: CommandId,
        /// Parse failure.
        reason: String,
    },
}

impl Incoming {
    /// Parses and classifies an inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not a JSON object of the expected shape
    /// - [`Error::ProtocolViolation`] if an event has no valid `Domain.event` method
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let lenient_id = value
            .get("id")
            .and_then(|id| CommandId::deserialize(id).ok());

        let frame: RawFrame = match serde_json::from_value(value) {
            Ok(frame) => frame,
            Err(e) => match lenient_id {
                Some(id) => {
                    return Ok(Self::MalformedResponse {
                        id,
                        reason: e.to_string(),
                    });
                }
                None => return Err(e.into()),
            },
        };

        if let Some(id) = frame.id {
            return Ok(Self::Response(Response {
                id,
                result: frame.result,
                error: frame.error,
            }));
        }

        let method = frame
            .method
            .ok_or_else(|| Error::protocol_violation("frame has neither id nor method"))?;

        if split_method(&method).is_none() {
            return Err(Error::protocol_violation(format!(
                "malformed event method '{method}'"
            )));
        }

        Ok(Self::Event(Event {
            method,
            params: frame.params.unwrap_or(Value::Null),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
