use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    aggregate::{self, FinishedGame},
    models::{HistoryEntry, PlayerStats, PlayerSummary},
};
use crate::{
    game::{models::GameRecord, repository::GameRepository, Game},
    shared::AppError,
};

/// Read-only statistics over finished games
pub struct StatsService {
    repository: Arc<dyn GameRepository>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn GameRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn player_stats(&self, name: &str) -> Result<PlayerStats, AppError> {
        let games = self.finished_games().await?;
        Ok(aggregate::player_stats(name.trim(), &games))
    }

    #[instrument(skip(self))]
    pub async fn list_players(&self, filter: Option<&str>) -> Result<Vec<PlayerSummary>, AppError> {
        let games = self.finished_games().await?;
        Ok(aggregate::list_players(&games, filter))
    }

    #[instrument(skip(self))]
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, AppError> {
        let games = self.finished_games().await?;
        Ok(aggregate::history(&games))
    }

    async fn finished_games(&self) -> Result<Vec<FinishedGame>, AppError> {
        let records = self.repository.list_finished_games().await?;
        debug!(count = records.len(), "Aggregating finished games");
        records.into_iter().map(finished_game).collect()
    }
}

// Totals are recomputed from the stored cells, never read from a column
fn finished_game(record: GameRecord) -> Result<FinishedGame, AppError> {
    let game = Game::try_from(record)?;
    let ended_at = game.ended_at().ok_or_else(|| {
        AppError::DatabaseError(format!("finished game {} has no end time", game.id()))
    })?;

    Ok(FinishedGame {
        game_id: game.id(),
        ended_at,
        players: game
            .final_scores()
            .into_iter()
            .map(|score| (score.name, score.totals.total))
            .collect(),
    })
}
