use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregates for one player across every finished game they sat in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player: String,
    pub games: u32,
    pub best_score: i32,
    pub average_score: i32,
    pub top3: Vec<TopGame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopGame {
    pub game_id: i64,
    pub ended_at: DateTime<Utc>,
    pub total: i32,
}

/// One row of the player listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub name: String,
    pub games: u32,
    pub best_score: i32,
    pub average_score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub game_id: i64,
    pub ended_at: DateTime<Utc>,
    pub players: Vec<HistoryPlayer>, // highest total first
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPlayer {
    pub name: String,
    pub total: i32,
}
