//! Inbound and outbound message types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{TYPE_LOGIN, TYPE_USER_LIST};

/// Error parsing or encoding a wire message
///
/// The `Display` text is what the client sees in the `error` reply.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Frame is JSON but not an object
    #[error("message must be a JSON object")]
    NotAnObject,
    /// Required string field is absent or not a string
    #[error("missing or invalid field: {0}")]
    MissingField(&'static str),
    /// Frame type the server does not accept
    #[error("unsupported frame: {0}")]
    Unsupported(&'static str),
    /// Outbound message could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A routed message, kept as the exact text the sender wrote
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedMessage {
    /// Application-defined `type` (offer, answer, candidate, ...)
    pub kind: String,
    /// Recipient identity
    pub target: String,
    /// Sender-declared `name`, if present
    pub sender: Option<String>,
    /// Exact frame text as received, forwarded unchanged
    pub raw: String,
}

/// Message received from a client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Login handshake carrying the requested name
    Login { name: String },
    /// Presence frame echoed by a client; carries nothing to act on
    Presence,
    /// Anything else; must name a `target`
    Routed(RoutedMessage),
}

impl ClientMessage {
    /// Whether an active session should ignore this message
    pub fn is_noop(&self) -> bool {
        matches!(self, ClientMessage::Login { .. } | ClientMessage::Presence)
    }
}

/// Parse one text frame
pub fn parse(text: &str) -> Result<ClientMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let kind = string_field(object, "type").ok_or(ProtocolError::MissingField("type"))?;

    match kind {
        TYPE_LOGIN => {
            let name = string_field(object, "name").ok_or(ProtocolError::MissingField("name"))?;
            Ok(ClientMessage::Login {
                name: name.to_string(),
            })
        }
        TYPE_USER_LIST => Ok(ClientMessage::Presence),
        _ => {
            let target =
                string_field(object, "target").ok_or(ProtocolError::MissingField("target"))?;
            Ok(ClientMessage::Routed(RoutedMessage {
                kind: kind.to_string(),
                target: target.to_string(),
                sender: string_field(object, "name").map(str::to_string),
                raw: text.to_string(),
            }))
        }
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// Message sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Login handshake result
    Login {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Current presence list
    UserList { users: Vec<String> },
    /// Human-readable failure
    Error { message: String },
}

impl ServerMessage {
    /// Successful login acknowledgement
    pub fn login_ok() -> Self {
        ServerMessage::Login {
            success: true,
            message: None,
        }
    }

    /// Refused login with a reason
    pub fn login_failed(reason: impl Into<String>) -> Self {
        ServerMessage::Login {
            success: false,
            message: Some(reason.into()),
        }
    }

    /// Error reply
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serialize to a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}
