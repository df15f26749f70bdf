//! Wire message types.
//!
//! Defines the JSON envelope format exchanged with the peer. The format is
//! transport-agnostic; framing is the transport collaborator's concern.
//!
//! # Format
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | Command | Local → Remote | `{"id": N, "method": "Domain.method", "params"?: {...}}` |
//! | Response | Remote → Local | `{"id": N, "result"?: {...}, "error"?: {"message": "...", "code"?: C}}` |
//! | Event | Remote → Local | `{"method": "Domain.eventName", "params"?: {...}}` |
//!
//! Inbound classification is decided solely by the presence of an `id`
//! field: with `id` the message is a response, without it an event.
//! Callers of [`Message::classify`] never need to distinguish the two
//! themselves.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::SequenceId;

// ============================================================================
// Constants
// ============================================================================

/// Error code the peer uses for expected/benign failures.
///
/// Responses carrying this code are still delivered to the caller as
/// errors, but are not logged as diagnostics.
pub const BENIGN_ERROR_CODE: i64 = -32000;

// ============================================================================
// Types
// ============================================================================

/// Open string-keyed parameter mapping.
pub type ParamsMap = serde_json::Map<String, Value>;

// ============================================================================
// CommandEnvelope
// ============================================================================

/// An outgoing command from local end to remote end.
///
/// The `params` key is omitted entirely when no parameter is supplied —
/// never serialized as an empty object.
#[derive(Debug, Clone, Serialize)]
pub struct CommandEnvelope {
    /// Unique identifier for request/response correlation.
    pub id: SequenceId,

    /// Command name in `Domain.method` format.
    pub method: String,

    /// Command parameters, absent when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamsMap>,
}

impl CommandEnvelope {
    /// Creates a command envelope, normalizing an empty params map to
    /// an absent `params` key.
    #[inline]
    #[must_use]
    pub fn new(id: SequenceId, method: impl Into<String>, params: Option<ParamsMap>) -> Self {
        let params = params.filter(|map| !map.is_empty());
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

/// A response from remote end to local end, correlated by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: SequenceId,

    /// Result mapping (if success).
    #[serde(default)]
    pub result: Option<ParamsMap>,

    /// Error payload (if the peer failed the command).
    #[serde(default)]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Returns `true` if the peer reported an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result mapping, or the peer's error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PeerReported`] when the response carries an
    /// `error` field.
    pub fn into_result(self) -> Result<ParamsMap> {
        match self.error {
            Some(error) => Err(Error::peer_reported(error.message, error.code)),
            None => Ok(self.result.unwrap_or_default()),
        }
    }
}

// ============================================================================
// ResponseError
// ============================================================================

/// Error payload of a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    /// Human-readable error message.
    pub message: String,

    /// Optional numeric error code.
    #[serde(default)]
    pub code: Option<i64>,
}

impl ResponseError {
    /// Returns `true` if the code matches the benign sentinel.
    ///
    /// Benign errors are delivered to the caller but not logged.
    #[inline]
    #[must_use]
    pub fn is_benign(&self) -> bool {
        self.code == Some(BENIGN_ERROR_CODE)
    }
}

// ============================================================================
// EventMessage
// ============================================================================

/// An event notification from remote end to local end.
///
/// Events carry no `id` and expect no reply.
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    /// Event name in `Domain.eventName` format.
    ///
    /// Split into its `(domain, event)` halves with
    /// [`split_qualified`](crate::protocol::split_qualified) at dispatch
    /// time.
    pub method: String,

    /// Event-specific data, absent when the event carries none.
    #[serde(default)]
    pub params: Option<ParamsMap>,
}

// ============================================================================
// Message
// ============================================================================

/// An inbound message, classified as response or event.
#[derive(Debug, Clone)]
pub enum Message {
    /// A response correlated to a previously sent command.
    Response(Response),

    /// An event notification.
    Event(EventMessage),
}

impl Message {
    /// Classifies an already-parsed value as response or event.
    ///
    /// A message with an `id` field is a response; anything else is an
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the value does not match either shape.
    pub fn classify(value: Value) -> Result<Self> {
        if value.get("id").is_some() {
            Ok(Self::Response(serde_json::from_value(value)?))
        } else {
            Ok(Self::Event(serde_json::from_value(value)?))
        }
    }

    /// Parses wire text and classifies it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not valid JSON or does not
    /// match either message shape.
    pub fn parse(text: &str) -> Result<Self> {
        Self::classify(serde_json::from_str(text)?)
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
    fn test_params_omitted_when_empty() {
        let envelope = CommandEnvelope::new(SequenceId::from_raw(1), "X.y", Some(ParamsMap::new()));
        let json = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(json, r#"{"id":1,"method":"X.y"}"#);
    }

    #[test]
    fn test_params_omitted_when_none() {
        let envelope = CommandEnvelope::new(SequenceId::from_raw(2), "X.y", None);
        let json = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(json, r#"{"id":2,"method":"X.y"}"#);
    }

    #[test]
    fn test_params_present_when_supplied() {
        let mut params = ParamsMap::new();
        params.insert("a".into(), json!(1));

        let envelope = CommandEnvelope::new(SequenceId::from_raw(3), "X.y", Some(params));
        let json = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(json, r#"{"id":3,"method":"X.y","params":{"a":1}}"#);
    }

    #[test]
    fn test_classify_response() {
        let message = Message::parse(r#"{"id":7,"result":{"value":42}}"#).expect("parse");
        match message {
            Message::Response(response) => {
                assert_eq!(response.id, SequenceId::from_raw(7));
                assert!(!response.is_error());
            }
            Message::Event(_) => panic!("expected response"),
        }
    }

    #[test]
    fn test_classify_event() {
        let message =
            Message::parse(r#"{"method":"Page.loadEventFired","params":{"timestamp":1.5}}"#)
                .expect("parse");
        match message {
            Message::Event(event) => {
                assert_eq!(event.method, "Page.loadEventFired");
                assert_eq!(
                    event.params.and_then(|p| p.get("timestamp").cloned()),
                    Some(json!(1.5))
                );
            }
            Message::Response(_) => panic!("expected event"),
        }
    }

    #[test]
    fn test_into_result_success() {
        let response: Response =
            serde_json::from_str(r#"{"id":1,"result":{"value":42}}"#).expect("parse");
        let result = response.into_result().expect("should succeed");
        assert_eq!(result.get("value").and_then(Value::as_u64), Some(42));
    }

    #[test]
    fn test_into_result_missing_result_is_empty_map() {
        let response: Response = serde_json::from_str(r#"{"id":1}"#).expect("parse");
        let result = response.into_result().expect("should succeed");
        assert!(result.is_empty());
    }

    #[test]
    fn test_into_result_error() {
        let response: Response = serde_json::from_str(
            r#"{"id":1,"error":{"message":"method not found","code":-32601}}"#,
        )
        .expect("parse");

        let err = response.into_result().unwrap_err();
        assert!(err.is_peer_reported());
        assert_eq!(err.peer_code(), Some(-32601));
    }

    #[test]
    fn test_benign_error_code() {
        let error = ResponseError {
            message: "expected".into(),
            code: Some(BENIGN_ERROR_CODE),
        };
        assert!(error.is_benign());

        let error = ResponseError {
            message: "unexpected".into(),
            code: Some(-32601),
        };
        assert!(!error.is_benign());

        let error = ResponseError {
            message: "no code".into(),
            code: None,
        };
        assert!(!error.is_benign());
    }

    #[test]
    fn test_event_without_params() {
        let message = Message::parse(r#"{"method":"Network.loadingFinished"}"#).expect("parse");
        match message {
            Message::Event(event) => assert!(event.params.is_none()),
            Message::Response(_) => panic!("expected event"),
        }
    }
}
