// Library crate for the Kniffel scoreboard server
// This file exposes the public API for integration tests

pub mod config;
pub mod game;
pub mod leaderboard;
pub mod router;
pub mod scoring;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use game::{repository::GameRepository, GameError, GameService};
pub use leaderboard::LeaderboardService;
pub use router::app_router;
pub use shared::{AppError, AppState};
pub use stats::StatsService;
