use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::capture::capture_output;
use crate::dispatch::{self, validate_command};
use crate::protocol::{Ack, HealthResponse, OutputSnapshot, SendRequest, StatusSnapshot};
use crate::status::get_status;

use super::error::ApiError;
use super::AppState;

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        polling_interval_ms: state.manager.config().polling_interval_ms,
    })
}

pub(super) async fn send(
    State(state): State<AppState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let command = match body {
        Ok(Json(SendRequest {
            command: Some(command),
        })) => command,
        Ok(_) => return Err(ApiError::MissingCommand),
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected send body");
            return Err(ApiError::MissingCommand);
        }
    };
    validate_command(&command, state.manager.config().max_command_length)?;

    let _scope = state.manager.lock().await;
    state.manager.ensure_session().await?;
    let ack = dispatch::send(&state.manager, &command).await?;
    Ok(Json(ack))
}

pub(super) async fn output(State(state): State<AppState>) -> Result<Json<OutputSnapshot>, ApiError> {
    let _scope = state.manager.lock().await;
    state.manager.ensure_session().await?;
    let snapshot = capture_output(&state.manager).await?;
    Ok(Json(snapshot))
}

pub(super) async fn status(State(state): State<AppState>) -> Result<Json<StatusSnapshot>, ApiError> {
    let snapshot = get_status(&state.manager).await?;
    Ok(Json(snapshot))
}

pub(super) async fn restart(State(state): State<AppState>) -> Result<Json<Ack>, ApiError> {
    let _scope = state.manager.lock().await;
    state.manager.restart_session().await?;
    Ok(Json(Ack::success("Claude session restarted successfully")))
}

pub(super) async fn not_found() -> ApiError {
    ApiError::NotFound
}
