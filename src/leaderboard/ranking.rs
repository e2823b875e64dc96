use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::NewHighscore;
use crate::scoring::Totals;

/// One player's final totals, in participant order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalScore {
    pub player_id: i64,
    pub name: String,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub place: u32,
    pub player_id: i64,
    pub name: String,
    pub upper: i32,
    pub bonus: i32,
    pub lower: i32,
    pub total: i32,
}

/// Orders players by total, highest first.
///
/// Equal totals keep their input order and still get distinct consecutive
/// places.
pub fn rank(mut scores: Vec<FinalScore>) -> Vec<RankingEntry> {
    // sort_by is stable
    scores.sort_by(|a, b| b.totals.total.cmp(&a.totals.total));
    scores
        .into_iter()
        .enumerate()
        .map(|(idx, score)| RankingEntry {
            place: idx as u32 + 1,
            player_id: score.player_id,
            name: score.name,
            upper: score.totals.upper,
            bonus: score.totals.bonus,
            lower: score.totals.lower,
            total: score.totals.total,
        })
        .collect()
}

/// Folds a finished ranking into one leaderboard row per player.
pub fn highscores(ranking: &[RankingEntry], achieved_at: DateTime<Utc>) -> Vec<NewHighscore> {
    ranking
        .iter()
        .map(|entry| NewHighscore {
            player_name: entry.name.clone(),
            score: entry.total,
            achieved_at,
        })
        .collect()
}
