use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::{models::HighscoreModel, service::LeaderboardService};
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct HighscoreQuery {
    pub limit: Option<String>, // unparsable values fall back to the default
}

impl HighscoreQuery {
    pub fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

/// HTTP handler for the highscore listing
///
/// GET /api/highscores?limit=N
#[instrument(name = "list_highscores", skip(state))]
pub async fn list_highscores(
    State(state): State<AppState>,
    Query(query): Query<HighscoreQuery>,
) -> Result<Json<Vec<HighscoreModel>>, AppError> {
    let service = LeaderboardService::new(Arc::clone(&state.game_repository));
    Ok(Json(service.top(query.limit()).await?))
}
