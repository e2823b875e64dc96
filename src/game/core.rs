// A Game is one scoresheet session: up to four players, each with a sheet of
// category cells. It is Active from creation until Finish, which happens at
// most once and only when every player has filled all thirteen categories.

// The pure state machine lives here. Loading and persisting a Game is the
// service's job; nothing in this file performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum_macros::{Display, EnumString};

use crate::leaderboard::{
    models::NewHighscore,
    ranking::{self, FinalScore, RankingEntry},
};
use crate::scoring::{Category, Scoresheet, Totals, Validation, KNIFFEL_BONUS_STEP, KNIFFEL_SCORE, RULES};

pub const MAX_PLAYERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Game is not active")]
    GameNotActive,
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Player {0} is not in this game")]
    PlayerNotInGame(i64),
    #[error("Not all scores are set")]
    IncompleteScoresheet,
    #[error("Game already finished")]
    AlreadyFinished,
}

impl GameError {
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidInput(_) => "invalid_input",
            GameError::GameNotActive => "game_not_active",
            GameError::InvalidCategory(_) => "invalid_category",
            GameError::InvalidValue(_) => "invalid_value",
            GameError::PlayerNotInGame(_) => "player_not_in_game",
            GameError::IncompleteScoresheet => "incomplete_scoresheet",
            GameError::AlreadyFinished => "already_finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub order_index: i32,
}

#[derive(Debug, Clone)]
struct Seat {
    player: Participant,
    sheet: Scoresheet,
}

// ended_at exists exactly when the game is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    Finished(DateTime<Utc>),
}

/// Result of the Finish transition, to be persisted atomically.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub ended_at: DateTime<Utc>,
    pub ranking: Vec<RankingEntry>,
    pub highscores: Vec<NewHighscore>,
}

/// Trims the names for a new game and checks there are 1 to 4 distinct,
/// non-blank ones.
pub fn validate_player_names(names: &[String]) -> Result<Vec<String>, GameError> {
    if names.is_empty() || names.len() > MAX_PLAYERS {
        return Err(GameError::InvalidInput(format!(
            "players must be a list of 1-{} names",
            MAX_PLAYERS
        )));
    }

    let trimmed: Vec<String> = names.iter().map(|name| name.trim().to_string()).collect();
    if trimmed.iter().any(|name| name.is_empty()) {
        return Err(GameError::InvalidInput(
            "all player names must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for name in &trimmed {
        if !seen.insert(name.as_str()) {
            return Err(GameError::InvalidInput(format!(
                "player name '{}' appears more than once",
                name
            )));
        }
    }

    Ok(trimmed)
}

#[derive(Debug, Clone)]
pub struct Game {
    id: i64,
    started_at: DateTime<Utc>,
    lifecycle: Lifecycle,
    seats: Vec<Seat>, // ordered by order_index
}

impl Game {
    pub fn new(id: i64, started_at: DateTime<Utc>, players: Vec<Participant>) -> Self {
        Self::from_parts(id, started_at, None, players, BTreeMap::new())
    }

    /// Rebuilds a game from stored parts. A present `ended_at` means finished.
    pub fn from_parts(
        id: i64,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        mut players: Vec<Participant>,
        mut sheets: BTreeMap<i64, Scoresheet>,
    ) -> Self {
        players.sort_by_key(|p| p.order_index);
        let seats = players
            .into_iter()
            .map(|player| Seat {
                sheet: sheets.remove(&player.id).unwrap_or_default(),
                player,
            })
            .collect();

        Self {
            id,
            started_at,
            lifecycle: match ended_at {
                Some(at) => Lifecycle::Finished(at),
                None => Lifecycle::Active,
            },
            seats,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self.lifecycle {
            Lifecycle::Active => None,
            Lifecycle::Finished(at) => Some(at),
        }
    }

    pub fn status(&self) -> GameStatus {
        match self.lifecycle {
            Lifecycle::Active => GameStatus::Active,
            Lifecycle::Finished(_) => GameStatus::Finished,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn players(&self) -> impl Iterator<Item = &Participant> {
        self.seats.iter().map(|seat| &seat.player)
    }

    pub fn sheet(&self, player_id: i64) -> Option<&Scoresheet> {
        self.seat(player_id).ok().map(|seat| &seat.sheet)
    }

    pub fn ensure_active(&self) -> Result<(), GameError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(GameError::GameNotActive)
        }
    }

    pub fn ensure_participant(&self, player_id: i64) -> Result<(), GameError> {
        self.seat(player_id).map(|_| ())
    }

    /// Upserts one category value after validating it. On error nothing
    /// changes. Returns the stored value.
    pub fn record_score(
        &mut self,
        player_id: i64,
        category: Category,
        value: i64,
    ) -> Result<i32, GameError> {
        self.ensure_active()?;
        let seat = self.seat_mut(player_id)?;

        if !RULES.rule(category).direct_entry {
            return Err(GameError::InvalidCategory(format!(
                "{} can only be changed through the kniffel bonus adjustment",
                category
            )));
        }

        match RULES.validate(category, value) {
            Validation::Legal(stored) => {
                seat.sheet.set(category, stored);
                Ok(stored)
            }
            Validation::Illegal => Err(GameError::InvalidValue(format!(
                "{} is not a legal score for {}",
                value, category
            ))),
        }
    }

    /// Moves the kniffel bonus by one step up or down, never below zero.
    /// Only allowed while the player's kniffel holds exactly 50.
    pub fn adjust_kniffel_bonus(&mut self, player_id: i64, delta: i64) -> Result<i32, GameError> {
        self.ensure_active()?;
        let seat = self.seat_mut(player_id)?;

        if delta.abs() != i64::from(KNIFFEL_BONUS_STEP) {
            return Err(GameError::InvalidValue(format!(
                "kniffel bonus moves in steps of {}, got {}",
                KNIFFEL_BONUS_STEP, delta
            )));
        }
        if seat.sheet.get(Category::Kniffel) != Some(KNIFFEL_SCORE) {
            return Err(GameError::InvalidValue(format!(
                "kniffel bonus requires a kniffel of {}",
                KNIFFEL_SCORE
            )));
        }

        let current = i64::from(seat.sheet.get(Category::KniffelBonus).unwrap_or(0));
        let proposed = (current + delta).max(0);
        match RULES.validate(Category::KniffelBonus, proposed) {
            Validation::Legal(stored) => {
                seat.sheet.set(Category::KniffelBonus, stored);
                Ok(stored)
            }
            Validation::Illegal => Err(GameError::InvalidValue(format!(
                "kniffel bonus of {} is out of range",
                proposed
            ))),
        }
    }

    /// Every participant has all thirteen canonical categories filled.
    pub fn all_filled(&self) -> bool {
        self.seats.iter().all(|seat| seat.sheet.is_complete())
    }

    pub fn totals_for(&self, player_id: i64) -> Option<Totals> {
        self.sheet(player_id).map(|sheet| RULES.totals(sheet))
    }

    pub fn totals(&self) -> BTreeMap<i64, Totals> {
        self.seats
            .iter()
            .map(|seat| (seat.player.id, RULES.totals(&seat.sheet)))
            .collect()
    }

    pub fn sheets(&self) -> BTreeMap<i64, Scoresheet> {
        self.seats
            .iter()
            .map(|seat| (seat.player.id, seat.sheet.clone()))
            .collect()
    }

    /// Totals recomputed from the raw cells, in participant order.
    pub fn final_scores(&self) -> Vec<FinalScore> {
        self.seats
            .iter()
            .map(|seat| FinalScore {
                player_id: seat.player.id,
                name: seat.player.name.clone(),
                totals: RULES.totals(&seat.sheet),
            })
            .collect()
    }

    /// Active -> Finished. Produces the ranking and one highscore per player,
    /// all stamped with `now`.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<FinishOutcome, GameError> {
        if !self.is_active() {
            return Err(GameError::AlreadyFinished);
        }
        if !self.all_filled() {
            return Err(GameError::IncompleteScoresheet);
        }

        let ranking = ranking::rank(self.final_scores());
        let highscores = ranking::highscores(&ranking, now);
        self.lifecycle = Lifecycle::Finished(now);

        Ok(FinishOutcome {
            ended_at: now,
            ranking,
            highscores,
        })
    }

    fn seat(&self, player_id: i64) -> Result<&Seat, GameError> {
        self.seats
            .iter()
            .find(|seat| seat.player.id == player_id)
            .ok_or(GameError::PlayerNotInGame(player_id))
    }

    fn seat_mut(&mut self, player_id: i64) -> Result<&mut Seat, GameError> {
        self.seats
            .iter_mut()
            .find(|seat| seat.player.id == player_id)
            .ok_or(GameError::PlayerNotInGame(player_id))
    }
}
