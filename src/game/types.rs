use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::core::{Game, GameError, GameStatus, Participant};
use crate::leaderboard::ranking::RankingEntry;
use crate::scoring::{Category, Scoresheet, Totals};

/// A score value as it arrived from the client.
///
/// Anything that is not an integral JSON number ends up as `NotInteger` so
/// the service can report it as an invalid value instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawScore {
    Integer(i64),
    #[default]
    NotInteger,
}

impl From<i64> for RawScore {
    fn from(value: i64) -> Self {
        RawScore::Integer(value)
    }
}

impl<'de> Deserialize<'de> for RawScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match value {
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => RawScore::Integer(int),
                None => match number.as_f64() {
                    Some(float)
                        if float.fract() == 0.0
                            && float >= i64::MIN as f64
                            && float <= i64::MAX as f64 =>
                    {
                        RawScore::Integer(float as i64)
                    }
                    _ => RawScore::NotInteger,
                },
            },
            _ => RawScore::NotInteger,
        };
        Ok(raw)
    }
}

impl RawScore {
    pub fn integer(self) -> Option<i64> {
        match self {
            RawScore::Integer(value) => Some(value),
            RawScore::NotInteger => None,
        }
    }
}

fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(RawScore::deserialize(deserializer)?.integer())
}

// Anything but a JSON string reads as blank
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        _ => Ok(String::new()),
    }
}

/// The `players` field as it arrived. Only an array of strings is a list of
/// names; everything else is reported as invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawPlayers {
    Names(Vec<String>),
    #[default]
    Malformed,
}

impl RawPlayers {
    pub fn into_names(self) -> Result<Vec<String>, GameError> {
        match self {
            RawPlayers::Names(names) => Ok(names),
            RawPlayers::Malformed => Err(GameError::InvalidInput(
                "players must be a list of names".to_string(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for RawPlayers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(name) => Some(name),
                    _ => None,
                })
                .collect::<Option<Vec<String>>>()
                .map_or(RawPlayers::Malformed, RawPlayers::Names),
            _ => RawPlayers::Malformed,
        };
        Ok(raw)
    }
}

/// Request payload for starting a game
#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    #[serde(default)]
    pub players: RawPlayers,
}

/// Response for a newly started game
#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub status: GameStatus,
    pub players: Vec<Participant>,
}

/// Request payload for recording one category value
#[derive(Debug, Deserialize)]
pub struct RecordScoreRequest {
    #[serde(default, deserialize_with = "lenient_integer")]
    pub player_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default)]
    pub value: RawScore,
}

/// Request payload for moving the kniffel bonus by one step
#[derive(Debug, Deserialize)]
pub struct AdjustBonusRequest {
    pub player_id: i64,
    pub delta: i64,
}

/// Full scoreboard state of one game
#[derive(Debug, Serialize)]
pub struct GameView {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: GameStatus,
    pub players: Vec<Participant>,
    pub scores: BTreeMap<i64, Scoresheet>,
    pub computed: BTreeMap<i64, Totals>,
    #[serde(rename = "allFilled")]
    pub all_filled: bool,
    pub categories: Vec<Category>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id(),
            started_at: game.started_at(),
            ended_at: game.ended_at(),
            status: game.status(),
            players: game.players().cloned().collect(),
            scores: game.sheets(),
            computed: game.totals(),
            all_filled: game.all_filled(),
            categories: Category::CANONICAL.to_vec(),
        }
    }
}

/// Response after a score was recorded
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreUpdateResponse {
    pub ok: bool,
    #[serde(rename = "allFilled")]
    pub all_filled: bool,
    pub computed: BTreeMap<i64, Totals>,
}

impl From<&Game> for ScoreUpdateResponse {
    fn from(game: &Game) -> Self {
        Self {
            ok: true,
            all_filled: game.all_filled(),
            computed: game.totals(),
        }
    }
}

/// Response after the kniffel bonus moved
#[derive(Debug, Serialize, Deserialize)]
pub struct BonusUpdateResponse {
    pub ok: bool,
    pub kniffel_bonus: i32,
    #[serde(rename = "allFilled")]
    pub all_filled: bool,
    pub computed: BTreeMap<i64, Totals>,
}

/// Response for a finished game
#[derive(Debug, Serialize, Deserialize)]
pub struct FinishResponse {
    pub ended_at: DateTime<Utc>,
    pub ranking: Vec<RankingEntry>,
}
