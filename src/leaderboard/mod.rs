pub use handlers::list_highscores;
pub use service::{LeaderboardService, DEFAULT_LIMIT};

pub mod models;
pub mod ranking;

mod handlers;
mod service;
