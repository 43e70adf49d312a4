//! JSON request/response bodies of the terminal API.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The single control sentinel the frontend sends for the Escape key.
pub const ESCAPE_SENTINEL: &str = "\u{1b}";

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub command: Option<String>,
}

/// `status` is always `"success"`; failures use the error envelope instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
    pub message: String,
    pub timestamp: f64,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            timestamp: unix_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    pub status: String,
    /// Pane text with ANSI sequences left in place.
    pub output: String,
    pub timestamp: f64,
}

/// Identifying metadata of the session's active pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_name: String,
    pub window_name: String,
    pub pane_pid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: String,
    pub session_exists: bool,
    pub session_name: String,
    /// Serialized as `{}` when absent.
    #[serde(with = "optional_object")]
    pub session_info: Option<SessionInfo>,
    pub timestamp: f64,
}

mod optional_object {
    use super::SessionInfo;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        info: &Option<SessionInfo>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match info {
            Some(info) => info.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SessionInfo>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
            other => SessionInfo::deserialize(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// How often the frontend should poll the output endpoint.
    pub polling_interval_ms: u64,
}
