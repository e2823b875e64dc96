use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::{
    models::{HistoryEntry, PlayerStats, PlayerSummary},
    service::StatsService,
};
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct PlayerFilter {
    pub filter: Option<String>,
}

/// GET /api/stats/:name
#[instrument(name = "get_player_stats", skip(state))]
pub async fn get_player_stats(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PlayerStats>, AppError> {
    let service = StatsService::new(Arc::clone(&state.game_repository));
    Ok(Json(service.player_stats(&name).await?))
}

/// HTTP handler for the player listing
///
/// GET /api/stats?filter=substring
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(
    State(state): State<AppState>,
    Query(query): Query<PlayerFilter>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    let service = StatsService::new(Arc::clone(&state.game_repository));
    Ok(Json(service.list_players(query.filter.as_deref()).await?))
}

/// GET /api/history
#[instrument(name = "get_history", skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let service = StatsService::new(Arc::clone(&state.game_repository));
    Ok(Json(service.history().await?))
}
