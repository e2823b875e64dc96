use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    core::{validate_player_names, Game, GameError, GameStatus, Participant},
    repository::{GameRepository, GameTransaction},
    types::{
        BonusUpdateResponse, FinishResponse, GameView, RawScore, RecordScoreRequest,
        ScoreUpdateResponse, StartGameResponse,
    },
};
use crate::{scoring::Category, shared::AppError};

/// Service for the game lifecycle: start, score, finish
pub struct GameService {
    repository: Arc<dyn GameRepository>,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository>) -> Self {
        Self { repository }
    }

    /// Creates an active game, reusing player identities by name
    #[instrument(skip(self))]
    pub async fn start_game(&self, names: &[String]) -> Result<StartGameResponse, AppError> {
        let names = validate_player_names(names).map_err(|err| {
            debug!(error = %err, "Rejected player list");
            err
        })?;

        let mut tx = self.repository.begin().await?;
        let game = tx.insert_game(Utc::now()).await?;

        let mut players = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            let player = tx.get_or_create_player(name).await?;
            let order_index = idx as i32;
            tx.add_participant(game.id, player.id, order_index).await?;
            players.push(Participant {
                id: player.id,
                name: player.name,
                order_index,
            });
        }
        tx.commit().await?;

        info!(
            game_id = game.id,
            player_count = players.len(),
            "Game started"
        );

        Ok(StartGameResponse {
            id: game.id,
            started_at: game.started_at,
            status: GameStatus::Active,
            players,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_game(&self, game_id: i64) -> Result<GameView, AppError> {
        let record = self
            .repository
            .get_game(game_id)
            .await?
            .ok_or_else(|| not_found(game_id))?;
        let game = Game::try_from(record)?;
        Ok(GameView::from(&game))
    }

    /// Upserts one category value. Rejected values leave the stored one untouched.
    #[instrument(skip(self))]
    pub async fn record_score(
        &self,
        game_id: i64,
        player_id: i64,
        category: &str,
        value: RawScore,
    ) -> Result<ScoreUpdateResponse, AppError> {
        let mut tx = self.repository.begin().await?;
        let mut game = lock_game(tx.as_mut(), game_id).await?;

        game.ensure_active()?;
        game.ensure_participant(player_id)?;
        let category = Category::from_str(category)
            .map_err(|_| GameError::InvalidCategory(category.to_string()))?;
        let value = match value {
            RawScore::Integer(value) => value,
            RawScore::NotInteger => {
                return Err(GameError::InvalidValue("value must be an integer".to_string()).into())
            }
        };

        let stored = game.record_score(player_id, category, value).map_err(|err| {
            debug!(game_id, player_id, %category, value, error = %err, "Score rejected");
            err
        })?;
        tx.upsert_score(game_id, player_id, category, stored).await?;
        tx.commit().await?;

        debug!(game_id, player_id, %category, value = stored, "Score recorded");
        Ok(ScoreUpdateResponse::from(&game))
    }

    /// Records a score as submitted over HTTP, where the player id may be
    /// missing or malformed
    pub async fn record_score_entry(
        &self,
        game_id: i64,
        request: RecordScoreRequest,
    ) -> Result<ScoreUpdateResponse, AppError> {
        match request.player_id {
            Some(player_id) => {
                self.record_score(game_id, player_id, &request.category, request.value)
                    .await
            }
            None => {
                let mut tx = self.repository.begin().await?;
                lock_game(tx.as_mut(), game_id).await?.ensure_active()?;
                Err(GameError::InvalidCategory(
                    "player_id and category are required".to_string(),
                )
                .into())
            }
        }
    }

    /// Moves the kniffel bonus by +50 or -50
    #[instrument(skip(self))]
    pub async fn adjust_kniffel_bonus(
        &self,
        game_id: i64,
        player_id: i64,
        delta: i64,
    ) -> Result<BonusUpdateResponse, AppError> {
        let mut tx = self.repository.begin().await?;
        let mut game = lock_game(tx.as_mut(), game_id).await?;

        let kniffel_bonus = game.adjust_kniffel_bonus(player_id, delta)?;
        tx.upsert_score(game_id, player_id, Category::KniffelBonus, kniffel_bonus)
            .await?;
        tx.commit().await?;

        debug!(game_id, player_id, kniffel_bonus, "Kniffel bonus adjusted");
        Ok(BonusUpdateResponse {
            ok: true,
            kniffel_bonus,
            all_filled: game.all_filled(),
            computed: game.totals(),
        })
    }

    /// Finishes a complete game. The status change and every highscore row
    /// commit together or not at all.
    #[instrument(skip(self))]
    pub async fn finish_game(&self, game_id: i64) -> Result<FinishResponse, AppError> {
        let mut tx = self.repository.begin().await?;
        let mut game = lock_game(tx.as_mut(), game_id).await?;

        let outcome = game.finish(Utc::now()).map_err(|err| {
            warn!(game_id, error = %err, "Finish rejected");
            err
        })?;

        tx.mark_finished(game_id, outcome.ended_at).await?;
        for highscore in &outcome.highscores {
            tx.append_highscore(highscore).await?;
        }
        tx.commit().await?;

        if let Some(winner) = outcome.ranking.first() {
            info!(
                game_id,
                winner = %winner.name,
                total = winner.total,
                "Game finished"
            );
        }

        Ok(FinishResponse {
            ended_at: outcome.ended_at,
            ranking: outcome.ranking,
        })
    }
}

fn not_found(game_id: i64) -> AppError {
    AppError::NotFound(format!("game {} not found", game_id))
}

async fn lock_game(tx: &mut dyn GameTransaction, game_id: i64) -> Result<Game, AppError> {
    let record = tx
        .lock_game(game_id)
        .await?
        .ok_or_else(|| not_found(game_id))?;
    Game::try_from(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::repository::InMemoryGameRepository;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn service() -> (Arc<InMemoryGameRepository>, GameService) {
        let repo = Arc::new(InMemoryGameRepository::new());
        (repo.clone(), GameService::new(repo))
    }

    async fn fill_all(service: &GameService, game_id: i64, player_id: i64) {
        for category in Category::CANONICAL {
            service
                .record_score(game_id, player_id, category.as_str(), RawScore::Integer(0))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn start_game_assigns_order_and_reuses_players() {
        let (_, service) = service();
        let first = service.start_game(&names(&[" Ann ", "Bo"])).await.unwrap();
        assert_eq!(first.status, GameStatus::Active);
        assert_eq!(first.players[0].name, "Ann");
        assert_eq!(first.players[0].order_index, 0);
        assert_eq!(first.players[1].order_index, 1);

        let second = service.start_game(&names(&["Bo"])).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.players[0].id, first.players[1].id);
    }

    #[tokio::test]
    async fn start_game_rejects_bad_lists_without_writing() {
        let (repo, service) = service();
        for list in [names(&[]), names(&["a", "b", "c", "d", "e"]), names(&["a", " "])] {
            let err = service.start_game(&list).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_input");
        }
        assert_eq!(repo.game_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let (_, service) = service();
        assert!(matches!(
            service.get_game(42).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.record_score(42, 1, "ones", 1.into()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.finish_game(42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn record_score_reports_each_error_kind() {
        let (_, service) = service();
        let game = service.start_game(&names(&["Ann"])).await.unwrap();
        let ann = game.players[0].id;

        let kind = |result: Result<ScoreUpdateResponse, AppError>| result.unwrap_err().kind();
        assert_eq!(
            kind(service.record_score(game.id, ann + 100, "ones", 1.into()).await),
            "player_not_in_game"
        );
        assert_eq!(
            kind(service.record_score(game.id, ann, "yahtzee", 50.into()).await),
            "invalid_category"
        );
        assert_eq!(
            kind(service.record_score(game.id, ann, "ones", 7.into()).await),
            "invalid_value"
        );
        assert_eq!(
            kind(service.record_score(game.id, ann, "ones", RawScore::NotInteger).await),
            "invalid_value"
        );
        assert_eq!(
            kind(service.record_score(game.id, ann, "kniffel_bonus", 50.into()).await),
            "invalid_category"
        );
    }

    #[tokio::test]
    async fn score_entry_without_player_is_invalid_category() {
        let (_, service) = service();
        let game = service.start_game(&names(&["Ann"])).await.unwrap();
        let request = |player_id| RecordScoreRequest {
            player_id,
            category: "ones".to_string(),
            value: 1.into(),
        };

        let err = service
            .record_score_entry(game.id, request(None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_category");

        let err = service
            .record_score_entry(game.id + 1, request(None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let update = service
            .record_score_entry(game.id, request(Some(game.players[0].id)))
            .await
            .unwrap();
        assert_eq!(update.computed[&game.players[0].id].upper, 1);
    }

    #[tokio::test]
    async fn rejected_value_keeps_previous_one() {
        let (_, service) = service();
        let game = service.start_game(&names(&["Ann"])).await.unwrap();
        let ann = game.players[0].id;

        service
            .record_score(game.id, ann, "full_house", 25.into())
            .await
            .unwrap();
        assert!(service
            .record_score(game.id, ann, "full_house", 24.into())
            .await
            .is_err());

        let view = service.get_game(game.id).await.unwrap();
        assert_eq!(view.scores[&ann].get(Category::FullHouse), Some(25));
        assert_eq!(view.computed[&ann].lower, 25);
    }

    #[tokio::test]
    async fn record_score_returns_totals_and_completeness() {
        let (_, service) = service();
        let game = service.start_game(&names(&["Ann"])).await.unwrap();
        let ann = game.players[0].id;

        let update = service
            .record_score(game.id, ann, "sixes", 30.into())
            .await
            .unwrap();
        assert!(update.ok);
        assert!(!update.all_filled);
        assert_eq!(update.computed[&ann].upper, 30);
    }

    #[tokio::test]
    async fn kniffel_bonus_persists_through_the_service() {
        let (_, service) = service();
        let game = service.start_game(&names(&["Ann"])).await.unwrap();
        let ann = game.players[0].id;

        let err = service
            .adjust_kniffel_bonus(game.id, ann, 50)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_value");

        service
            .record_score(game.id, ann, "kniffel", 50.into())
            .await
            .unwrap();
        let update = service.adjust_kniffel_bonus(game.id, ann, 50).await.unwrap();
        assert_eq!(update.kniffel_bonus, 50);
        assert_eq!(update.computed[&ann].lower, 100);

        let view = service.get_game(game.id).await.unwrap();
        assert_eq!(view.scores[&ann].get(Category::KniffelBonus), Some(50));
    }

    #[tokio::test]
    async fn finish_is_atomic_and_single_shot() {
        let (repo, service) = service();
        let game = service.start_game(&names(&["Ann", "Bo"])).await.unwrap();
        let (ann, bo) = (game.players[0].id, game.players[1].id);

        fill_all(&service, game.id, ann).await;
        let err = service.finish_game(game.id).await.unwrap_err();
        assert_eq!(err.kind(), "incomplete_scoresheet");
        assert_eq!(repo.highscore_count().await, 0);

        fill_all(&service, game.id, bo).await;
        let finished = service.finish_game(game.id).await.unwrap();
        assert_eq!(finished.ranking.len(), 2);
        assert_eq!(repo.highscore_count().await, 2);

        let err = service.finish_game(game.id).await.unwrap_err();
        assert_eq!(err.kind(), "already_finished");
        assert_eq!(repo.highscore_count().await, 2);

        let err = service
            .record_score(game.id, ann, "ones", 1.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "game_not_active");

        let view = service.get_game(game.id).await.unwrap();
        assert_eq!(view.status, GameStatus::Finished);
        assert_eq!(view.ended_at, Some(finished.ended_at));
    }
}
