use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::core::{Game, GameStatus, Participant};
use crate::scoring::{Category, Scoresheet};
use crate::shared::AppError;

/// Database model for the games table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct GameModel {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>, // Set once the game is finished
    pub status: String,                  // "active" or "finished"
}

impl GameModel {
    pub fn new_active(id: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
            status: GameStatus::Active.to_string(),
        }
    }
}

/// Database model for the players table. Names are unique across all games.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PlayerModel {
    pub id: i64,
    pub name: String,
}

/// A game_players row joined with the player's name
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SeatModel {
    pub game_id: i64,
    pub player_id: i64,
    pub name: String,
    pub order_index: i32,
}

/// Database model for the scores table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ScoreModel {
    pub game_id: i64,
    pub player_id: i64,
    pub category: String,
    pub value: i32,
}

/// Everything stored about one game: header, participants and sparse scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub game: GameModel,
    pub seats: Vec<SeatModel>,
    pub scores: Vec<ScoreModel>,
}

impl TryFrom<GameRecord> for Game {
    type Error = AppError;

    fn try_from(record: GameRecord) -> Result<Self, Self::Error> {
        let GameRecord {
            game,
            seats,
            scores,
        } = record;

        let status = GameStatus::from_str(&game.status).map_err(|_| {
            AppError::DatabaseError(format!(
                "game {} has unknown status '{}'",
                game.id, game.status
            ))
        })?;
        let ended_at = match (status, game.ended_at) {
            (GameStatus::Active, None) => None,
            (GameStatus::Finished, Some(at)) => Some(at),
            _ => {
                return Err(AppError::DatabaseError(format!(
                    "game {} has status {} inconsistent with its end time",
                    game.id, status
                )))
            }
        };

        let mut sheets: BTreeMap<i64, Scoresheet> = BTreeMap::new();
        for score in scores {
            let category = Category::from_str(&score.category).map_err(|_| {
                AppError::DatabaseError(format!(
                    "game {} has unknown category '{}'",
                    game.id, score.category
                ))
            })?;
            if !seats.iter().any(|seat| seat.player_id == score.player_id) {
                return Err(AppError::DatabaseError(format!(
                    "game {} has scores for non-participant {}",
                    game.id, score.player_id
                )));
            }
            sheets
                .entry(score.player_id)
                .or_default()
                .set(category, score.value);
        }

        let players = seats
            .into_iter()
            .map(|seat| Participant {
                id: seat.player_id,
                name: seat.name,
                order_index: seat.order_index,
            })
            .collect();

        Ok(Game::from_parts(
            game.id,
            game.started_at,
            ended_at,
            players,
            sheets,
        ))
    }
}
