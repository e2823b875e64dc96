// Folds finished games into per-player statistics and the history view.
// Everything here is a pure function over already-loaded games.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::models::{HistoryEntry, HistoryPlayer, PlayerStats, PlayerSummary, TopGame};

pub const TOP_GAMES: usize = 3;

/// A finished game reduced to what the aggregates need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub game_id: i64,
    pub ended_at: DateTime<Utc>,
    pub players: Vec<(String, i32)>, // (name, total) in seat order
}

/// Mean rounded half up. An empty slice averages to 0.
pub fn rounded_mean(totals: &[i32]) -> i32 {
    if totals.is_empty() {
        return 0;
    }
    let n = totals.len() as i64;
    let sum: i64 = totals.iter().map(|&t| i64::from(t)).sum();
    (2 * sum + n).div_euclid(2 * n) as i32
}

// Every game the player took part in, oldest first
fn games_of<'a>(name: &str, games: &'a [FinishedGame]) -> Vec<(&'a FinishedGame, i32)> {
    let mut played: Vec<(&FinishedGame, i32)> = games
        .iter()
        .filter_map(|game| {
            game.players
                .iter()
                .find(|(player, _)| player == name)
                .map(|&(_, total)| (game, total))
        })
        .collect();
    played.sort_by(|a, b| {
        a.0.ended_at
            .cmp(&b.0.ended_at)
            .then_with(|| a.0.game_id.cmp(&b.0.game_id))
    });
    played
}

pub fn player_stats(name: &str, games: &[FinishedGame]) -> PlayerStats {
    let mut played = games_of(name, games);
    let totals: Vec<i32> = played.iter().map(|&(_, total)| total).collect();

    // stable: equal totals keep the earlier game first
    played.sort_by(|a, b| b.1.cmp(&a.1));
    let top3 = played
        .iter()
        .take(TOP_GAMES)
        .map(|&(game, total)| TopGame {
            game_id: game.game_id,
            ended_at: game.ended_at,
            total,
        })
        .collect();

    PlayerStats {
        player: name.to_string(),
        games: totals.len() as u32,
        best_score: totals.iter().copied().max().unwrap_or(0),
        average_score: rounded_mean(&totals),
        top3,
    }
}

/// Every player with at least one finished game, optionally narrowed to
/// names containing `filter` (case-insensitive).
pub fn list_players(games: &[FinishedGame], filter: Option<&str>) -> Vec<PlayerSummary> {
    let needle = filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let mut totals: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for game in games {
        for (name, total) in &game.players {
            totals.entry(name.as_str()).or_default().push(*total);
        }
    }

    let mut summaries: Vec<PlayerSummary> = totals
        .into_iter()
        .filter(|(name, _)| match &needle {
            Some(needle) => name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .map(|(name, totals)| PlayerSummary {
            name: name.to_string(),
            games: totals.len() as u32,
            best_score: totals.iter().copied().max().unwrap_or(0),
            average_score: rounded_mean(&totals),
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.average_score
            .cmp(&a.average_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// Most recent game first, each with its players ordered by total
pub fn history(games: &[FinishedGame]) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = games
        .iter()
        .map(|game| {
            let mut players: Vec<HistoryPlayer> = game
                .players
                .iter()
                .map(|(name, total)| HistoryPlayer {
                    name: name.clone(),
                    total: *total,
                })
                .collect();
            players.sort_by(|a, b| b.total.cmp(&a.total));
            HistoryEntry {
                game_id: game.game_id,
                ended_at: game.ended_at,
                players,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.ended_at
            .cmp(&a.ended_at)
            .then_with(|| b.game_id.cmp(&a.game_id))
    });
    entries
}
