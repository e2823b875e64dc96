use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::HighscoreModel;
use crate::{game::repository::GameRepository, shared::AppError};

pub const DEFAULT_LIMIT: i64 = 50;

/// Read side of the append-only highscore table
pub struct LeaderboardService {
    repository: Arc<dyn GameRepository>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn GameRepository>) -> Self {
        Self { repository }
    }

    /// Best scores first, earlier achievements winning ties
    #[instrument(skip(self))]
    pub async fn top(&self, limit: Option<i64>) -> Result<Vec<HighscoreModel>, AppError> {
        let limit = effective_limit(limit);
        let rows = self.repository.list_highscores(limit).await?;
        debug!(limit, count = rows.len(), "Highscores loaded");
        Ok(rows)
    }
}

fn effective_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(n) if n > 0 => n,
        _ => DEFAULT_LIMIT,
    }
}
