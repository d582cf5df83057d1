//! Player season-aggregate endpoint.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use boxscore_core::game::PlayerSeasonStats;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/players/season/{player_id}
async fn season_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerSeasonStats>, ApiError> {
    let stats = state.service.player_season_stats(&player_id).await?;
    Ok(Json(stats))
}

/// Returns the players router.
pub fn router() -> Router<AppState> {
    Router::new().route("/season/{player_id}", get(season_stats))
}
