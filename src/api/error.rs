use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dispatch::InvalidCommand;
use crate::error::BridgeError;

/// Error type for all API handlers.
///
/// Validation failures are 400 with a bare `{"error": ...}` body. Everything
/// else is 500 and also carries `"status": "timeout"` or `"status": "error"`
/// so the frontend can tell a slow tmux from a broken one.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Body missing, not JSON, or without a `command` string.
    MissingCommand,
    /// 400 - Command failed validation.
    InvalidCommand(InvalidCommand),
    /// 404 - No such route or asset.
    NotFound,
    /// 500 - A bridge operation failed or timed out.
    Bridge(BridgeError),
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        ApiError::Bridge(err)
    }
}

impl From<InvalidCommand> for ApiError {
    fn from(err: InvalidCommand) -> Self {
        match err {
            InvalidCommand::Empty => ApiError::MissingCommand,
            other => ApiError::InvalidCommand(other),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCommand | ApiError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Bridge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingCommand => "No command provided".to_string(),
            ApiError::InvalidCommand(InvalidCommand::TooLong { len, max }) => {
                format!("Command too long ({len} characters, max {max})")
            }
            ApiError::InvalidCommand(InvalidCommand::Empty) => "Empty command".to_string(),
            ApiError::NotFound => "Not found".to_string(),
            ApiError::Bridge(err) => err.to_string(),
        }
    }

    /// Value of the `status` field, for errors that carry one.
    pub fn status_tag(&self) -> Option<&'static str> {
        match self {
            ApiError::Bridge(err) if err.is_timeout() => Some("timeout"),
            ApiError::Bridge(_) => Some("error"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.message() });
        if let Some(tag) = self.status_tag() {
            body["status"] = serde_json::Value::from(tag);
        }
        if let ApiError::Bridge(err) = &self {
            tracing::error!(error = %err, "request failed");
        }
        (self.status_code(), Json(body)).into_response()
    }
}
