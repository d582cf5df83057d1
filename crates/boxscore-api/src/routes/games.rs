//! Game endpoints: the log-game write path and the per-game read.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use boxscore_core::game::{GameSheet, GameStatRow};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Response for a successfully logged game.
#[derive(Serialize)]
pub struct LogGameResponse {
    /// The durable game identifier.
    pub id: String,
}

/// POST /api/v1/games/log
async fn log_game(
    State(state): State<AppState>,
    Json(game): Json<GameSheet>,
) -> Result<Json<LogGameResponse>, ApiError> {
    let id = state.service.log_game(&game).await?;
    Ok(Json(LogGameResponse { id }))
}

/// GET /api/v1/games/{id}
async fn game_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GameStatRow>>, ApiError> {
    let rows = state.service.find_game(&id).await?;
    Ok(Json(rows))
}

/// Returns the games router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/log", post(log_game))
        .route("/{id}", get(game_stats))
}
