use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the append-only highscores table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct HighscoreModel {
    pub player_name: String,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
}

/// Highscore row waiting to be appended inside a finish transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHighscore {
    pub player_name: String,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
}

impl From<NewHighscore> for HighscoreModel {
    fn from(row: NewHighscore) -> Self {
        Self {
            player_name: row.player_name,
            score: row.score,
            achieved_at: row.achieved_at,
        }
    }
}
