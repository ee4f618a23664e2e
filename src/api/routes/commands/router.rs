//! Router for the commands API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::commands::Invocation;

type SharedState = Arc<AppState>;

/// List the descriptor of every command
async fn list_commands(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let descriptors = serde_json::to_value(state.commands.commands())?;
    Ok(Json(descriptors))
}

/// Run a command on behalf of a chat user
async fn run_command(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(req): Json<public::CommandRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invocation = Invocation::from(req);

    let Some(outcome) = state.commands.dispatch(&name, &invocation).await else {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Command {} not found", name),
        )
            .into_response());
    };

    // The caller gets the reply in this response, the channel post
    // follows it
    if let (Some(webhook), Some(content)) = (state.webhook.clone(), outcome.broadcast.clone()) {
        tokio::spawn(async move {
            if let Err(err) = webhook.send(&content).await {
                tracing::error!("[/{}] Failed to post notification: {}", name, err);
            }
        });
    }

    Ok(Json(public::CommandResponse::from(outcome)).into_response())
}

/// Create the commands router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::get(list_commands))
        .route("/{name}", axum::routing::post(run_command))
}
