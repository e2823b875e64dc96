// Public API
pub use self::core::{
    validate_player_names, FinishOutcome, Game, GameError, GameStatus, Participant, MAX_PLAYERS,
};
pub use handlers::{adjust_kniffel_bonus, finish_game, get_game, record_score, start_game};
pub use service::GameService;

pub mod models;
pub mod repository;
pub mod types;

// Internal modules
mod core;
mod handlers;
mod service;
