use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{game, leaderboard, shared::AppState, stats};

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Builds the full HTTP API over the given state
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/games", post(game::start_game))
        .route("/api/games/:id", get(game::get_game))
        .route("/api/games/:id/score", post(game::record_score))
        .route(
            "/api/games/:id/kniffel-bonus",
            post(game::adjust_kniffel_bonus),
        )
        .route("/api/games/:id/finish", post(game::finish_game))
        .route("/api/highscores", get(leaderboard::list_highscores))
        .route("/api/stats", get(stats::list_players))
        .route("/api/stats/history/all", get(stats::get_history))
        .route("/api/stats/:name", get(stats::get_player_stats))
        .route("/api/history", get(stats::get_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
