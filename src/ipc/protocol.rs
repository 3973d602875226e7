//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::{DisplayState, TrainerEvent};

/// Largest frame either side may send
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from a front-end to the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request the current display state
    GetStatus,

    /// Restart the trainer from the first level
    Reset,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to trainer event notifications
    Subscribe,
}

/// Responses from daemon to front-end
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current trainer status
    Status(TrainerStatus),

    /// Reset was handed to the trainer
    ResetAccepted,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A trainer event occurred
    Event { event: TrainerEvent },
}

/// Trainer status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct TrainerStatus {
    /// Daemon version
    pub version: String,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// What the renderer should show; absent until the trainer publishes
    pub display: Option<DisplayState>,
}

impl Default for TrainerStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: 0,
            display: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let req: Request = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(req, Request::Reset);
        let req: Request = serde_json::from_str(r#"{"type":"get_status"}"#).unwrap();
        assert_eq!(req, Request::GetStatus);
    }

    #[test]
    fn test_unknown_request_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"type":"set_level"}"#).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(TrainerStatus::default());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["type"], "status");
        assert!(json["display"].is_null());

        let json = serde_json::to_string(&Response::error("bad_request", "nope")).unwrap();
        assert!(json.contains("\"code\":\"bad_request\""));
    }

    #[test]
    fn test_notification_serialization() {
        let note = Notification::Event {
            event: TrainerEvent::ImageAdvanced {
                level: 2,
                image_index: 4,
            },
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["event"]["type"], "image_advanced");
        assert_eq!(json["event"]["image_index"], 4);
    }
}
