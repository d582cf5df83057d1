//! Team season-aggregate endpoint.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use boxscore_core::game::TeamSeasonStats;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/teams/stats/season/{team_id}
async fn season_stats(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamSeasonStats>, ApiError> {
    let stats = state.service.team_season_stats(&team_id).await?;
    Ok(Json(stats))
}

/// Returns the teams router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats/season/{team_id}", get(season_stats))
}
