pub use handlers::{get_history, get_player_stats, list_players};
pub use models::*;
pub use service::StatsService;

pub mod aggregate;
pub mod models;

mod handlers;
mod service;
