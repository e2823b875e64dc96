#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::Router;
use std::sync::Arc;

use knuffelboard::{
    app_router,
    game::{repository::InMemoryGameRepository, Participant},
    AppState, GameService, LeaderboardService, StatsService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub repository: Arc<InMemoryGameRepository>,
    pub game_service: GameService,
    pub stats_service: StatsService,
    pub leaderboard_service: LeaderboardService,
    pub router: Router,
    pub game_id: Option<i64>,
    pub players: Vec<Participant>,
}

impl TestSetup {
    /// Id of the game started by the builder
    pub fn game_id(&self) -> i64 {
        self.game_id.expect("builder was not given any players")
    }

    /// Id of a seated player, looked up by name
    pub fn player_id(&self, name: &str) -> i64 {
        self.players
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
            .unwrap_or_else(|| panic!("{} is not seated", name))
    }
}

pub struct TestSetupBuilder {
    players: Vec<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self { players: vec![] }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["Ann", "Bo"])
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["Ann", "Bo", "Cy", "Dee"])
    }

    /// Wires every service and the router to one shared in-memory store and
    /// starts a game when players were given
    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryGameRepository::new());
        let game_service = GameService::new(repository.clone());
        let stats_service = StatsService::new(repository.clone());
        let leaderboard_service = LeaderboardService::new(repository.clone());
        let router = app_router(AppState::new(repository.clone()));

        let (game_id, players) = if self.players.is_empty() {
            (None, vec![])
        } else {
            let game = game_service.start_game(&self.players).await.unwrap();
            (Some(game.id), game.players)
        };

        TestSetup {
            repository,
            game_service,
            stats_service,
            leaderboard_service,
            router,
            game_id,
            players,
        }
    }
}
