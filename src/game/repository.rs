use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use super::core::{GameError, GameStatus};
use super::models::{GameModel, GameRecord, PlayerModel, ScoreModel, SeatModel};
use crate::leaderboard::models::{HighscoreModel, NewHighscore};
use crate::scoring::Category;
use crate::shared::AppError;

/// Trait for game persistence.
///
/// Reads go straight to the store. Every write goes through a
/// [`GameTransaction`] obtained from [`GameRepository::begin`].
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn GameTransaction>, AppError>;
    async fn get_game(&self, game_id: i64) -> Result<Option<GameRecord>, AppError>;

    /// Finished games, most recently ended first
    async fn list_finished_games(&self) -> Result<Vec<GameRecord>, AppError>;

    /// Highscores by score descending, then oldest first
    async fn list_highscores(&self, limit: i64) -> Result<Vec<HighscoreModel>, AppError>;
}

/// A scoped unit of writes.
///
/// Nothing becomes visible until [`GameTransaction::commit`]. Dropping the
/// handle without committing rolls back every write made through it.
#[async_trait]
pub trait GameTransaction: Send {
    /// Reads a game inside the transaction, holding it against concurrent writers
    async fn lock_game(&mut self, game_id: i64) -> Result<Option<GameRecord>, AppError>;
    async fn insert_game(&mut self, started_at: DateTime<Utc>) -> Result<GameModel, AppError>;
    async fn get_or_create_player(&mut self, name: &str) -> Result<PlayerModel, AppError>;
    async fn add_participant(
        &mut self,
        game_id: i64,
        player_id: i64,
        order_index: i32,
    ) -> Result<(), AppError>;
    async fn upsert_score(
        &mut self,
        game_id: i64,
        player_id: i64,
        category: Category,
        value: i32,
    ) -> Result<(), AppError>;

    /// Fails with `AlreadyFinished` unless the game is still active
    async fn mark_finished(&mut self, game_id: i64, ended_at: DateTime<Utc>)
        -> Result<(), AppError>;
    async fn append_highscore(&mut self, highscore: &NewHighscore) -> Result<(), AppError>;
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Default)]
struct Store {
    last_game_id: i64,
    last_player_id: i64,
    games: BTreeMap<i64, GameModel>,
    players: HashMap<String, PlayerModel>,
    seats: BTreeMap<i64, Vec<SeatModel>>,
    scores: BTreeMap<(i64, i64, Category), i32>,
    highscores: Vec<HighscoreModel>,
}

impl Store {
    fn record(&self, game_id: i64) -> Option<GameRecord> {
        let game = self.games.get(&game_id)?.clone();
        let mut seats = self.seats.get(&game_id).cloned().unwrap_or_default();
        seats.sort_by_key(|seat| seat.order_index);
        let scores = self
            .scores
            .range((game_id, i64::MIN, Category::Ones)..=(game_id, i64::MAX, Category::KniffelBonus))
            .map(|(&(game_id, player_id, category), &value)| ScoreModel {
                game_id,
                player_id,
                category: category.to_string(),
                value,
            })
            .collect();

        Some(GameRecord {
            game,
            seats,
            scores,
        })
    }
}

/// In-memory implementation of GameRepository for development and testing
///
/// A transaction holds the store lock for its whole lifetime and works on a
/// copy that replaces the store on commit. Data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryGameRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Number of highscore rows recorded so far
    pub async fn highscore_count(&self) -> usize {
        self.store.lock().await.highscores.len()
    }

    /// Number of games, active or finished
    pub async fn game_count(&self) -> usize {
        self.store.lock().await.games.len()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn begin(&self) -> Result<Box<dyn GameTransaction>, AppError> {
        let guard = Arc::clone(&self.store).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryGameTransaction { guard, working }))
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: i64) -> Result<Option<GameRecord>, AppError> {
        debug!(game_id, "Fetching game from memory");
        Ok(self.store.lock().await.record(game_id))
    }

    #[instrument(skip(self))]
    async fn list_finished_games(&self) -> Result<Vec<GameRecord>, AppError> {
        let store = self.store.lock().await;
        let mut records: Vec<GameRecord> = store
            .games
            .values()
            .filter(|game| game.status == GameStatus::Finished.to_string())
            .filter_map(|game| store.record(game.id))
            .collect();
        records.sort_by(|a, b| b.game.ended_at.cmp(&a.game.ended_at));

        debug!(count = records.len(), "Finished games listed from memory");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list_highscores(&self, limit: i64) -> Result<Vec<HighscoreModel>, AppError> {
        let store = self.store.lock().await;
        let mut rows = store.highscores.clone();
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.achieved_at.cmp(&b.achieved_at))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

pub struct InMemoryGameTransaction {
    guard: OwnedMutexGuard<Store>,
    working: Store,
}

#[async_trait]
impl GameTransaction for InMemoryGameTransaction {
    async fn lock_game(&mut self, game_id: i64) -> Result<Option<GameRecord>, AppError> {
        Ok(self.working.record(game_id))
    }

    async fn insert_game(&mut self, started_at: DateTime<Utc>) -> Result<GameModel, AppError> {
        self.working.last_game_id += 1;
        let game = GameModel::new_active(self.working.last_game_id, started_at);
        self.working.games.insert(game.id, game.clone());
        debug!(game_id = game.id, "Game staged in memory");
        Ok(game)
    }

    async fn get_or_create_player(&mut self, name: &str) -> Result<PlayerModel, AppError> {
        if let Some(player) = self.working.players.get(name) {
            return Ok(player.clone());
        }
        self.working.last_player_id += 1;
        let player = PlayerModel {
            id: self.working.last_player_id,
            name: name.to_string(),
        };
        self.working
            .players
            .insert(player.name.clone(), player.clone());
        Ok(player)
    }

    async fn add_participant(
        &mut self,
        game_id: i64,
        player_id: i64,
        order_index: i32,
    ) -> Result<(), AppError> {
        let name = self
            .working
            .players
            .values()
            .find(|player| player.id == player_id)
            .map(|player| player.name.clone())
            .ok_or_else(|| AppError::DatabaseError(format!("unknown player {}", player_id)))?;

        let seats = self.working.seats.entry(game_id).or_default();
        if seats.iter().any(|seat| seat.player_id == player_id) {
            return Err(AppError::DatabaseError(format!(
                "player {} already seated in game {}",
                player_id, game_id
            )));
        }
        seats.push(SeatModel {
            game_id,
            player_id,
            name,
            order_index,
        });
        Ok(())
    }

    async fn upsert_score(
        &mut self,
        game_id: i64,
        player_id: i64,
        category: Category,
        value: i32,
    ) -> Result<(), AppError> {
        self.working
            .scores
            .insert((game_id, player_id, category), value);
        Ok(())
    }

    async fn mark_finished(
        &mut self,
        game_id: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let game = self
            .working
            .games
            .get_mut(&game_id)
            .ok_or_else(|| AppError::NotFound(format!("game {}", game_id)))?;
        if game.status != GameStatus::Active.to_string() {
            return Err(GameError::AlreadyFinished.into());
        }
        game.status = GameStatus::Finished.to_string();
        game.ended_at = Some(ended_at);
        Ok(())
    }

    async fn append_highscore(&mut self, highscore: &NewHighscore) -> Result<(), AppError> {
        self.working.highscores.push(highscore.clone().into());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let InMemoryGameTransaction { mut guard, working } = *self;
        *guard = working;
        debug!("In-memory transaction committed");
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Database operation failed");
    AppError::DatabaseError(e.to_string())
}

async fn load_record(
    conn: &mut PgConnection,
    game_id: i64,
    for_update: bool,
) -> Result<Option<GameRecord>, sqlx::Error> {
    let sql = if for_update {
        "SELECT id, started_at, ended_at, status FROM games WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT id, started_at, ended_at, status FROM games WHERE id = $1"
    };
    let game = match sqlx::query_as::<_, GameModel>(sql)
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?
    {
        Some(game) => game,
        None => return Ok(None),
    };

    let seats = sqlx::query_as::<_, SeatModel>(
        "SELECT gp.game_id, gp.player_id, p.name, gp.order_index
         FROM game_players gp JOIN players p ON p.id = gp.player_id
         WHERE gp.game_id = $1 ORDER BY gp.order_index ASC",
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?;

    let scores = sqlx::query_as::<_, ScoreModel>(
        "SELECT game_id, player_id, category, value FROM scores WHERE game_id = $1",
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(GameRecord {
        game,
        seats,
        scores,
    }))
}

/// PostgreSQL implementation of game repository
pub struct PostgresGameRepository {
    pool: PgPool,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await.map_err(db_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to run migrations");
                AppError::DatabaseError(e.to_string())
            })
    }
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    async fn begin(&self) -> Result<Box<dyn GameTransaction>, AppError> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PostgresGameTransaction { tx }))
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: i64) -> Result<Option<GameRecord>, AppError> {
        debug!(game_id, "Fetching game from database");
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        load_record(&mut *conn, game_id, false)
            .await
            .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn list_finished_games(&self) -> Result<Vec<GameRecord>, AppError> {
        let games = sqlx::query_as::<_, GameModel>(
            "SELECT id, started_at, ended_at, status FROM games
             WHERE status = 'finished' ORDER BY ended_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let ids: Vec<i64> = games.iter().map(|game| game.id).collect();

        let seats = sqlx::query_as::<_, SeatModel>(
            "SELECT gp.game_id, gp.player_id, p.name, gp.order_index
             FROM game_players gp JOIN players p ON p.id = gp.player_id
             WHERE gp.game_id = ANY($1) ORDER BY gp.game_id, gp.order_index ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let scores = sqlx::query_as::<_, ScoreModel>(
            "SELECT game_id, player_id, category, value FROM scores WHERE game_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut seats_by_game: HashMap<i64, Vec<SeatModel>> = HashMap::new();
        for seat in seats {
            seats_by_game.entry(seat.game_id).or_default().push(seat);
        }
        let mut scores_by_game: HashMap<i64, Vec<ScoreModel>> = HashMap::new();
        for score in scores {
            scores_by_game.entry(score.game_id).or_default().push(score);
        }

        let records: Vec<GameRecord> = games
            .into_iter()
            .map(|game| GameRecord {
                seats: seats_by_game.remove(&game.id).unwrap_or_default(),
                scores: scores_by_game.remove(&game.id).unwrap_or_default(),
                game,
            })
            .collect();

        debug!(count = records.len(), "Finished games listed from database");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list_highscores(&self, limit: i64) -> Result<Vec<HighscoreModel>, AppError> {
        sqlx::query_as::<_, HighscoreModel>(
            "SELECT player_name, score, achieved_at FROM highscores
             ORDER BY score DESC, achieved_at ASC, id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}

/// Wraps a sqlx transaction, which rolls back when dropped uncommitted
pub struct PostgresGameTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl GameTransaction for PostgresGameTransaction {
    async fn lock_game(&mut self, game_id: i64) -> Result<Option<GameRecord>, AppError> {
        load_record(&mut *self.tx, game_id, true)
            .await
            .map_err(db_error)
    }

    async fn insert_game(&mut self, started_at: DateTime<Utc>) -> Result<GameModel, AppError> {
        sqlx::query_as::<_, GameModel>(
            "INSERT INTO games (started_at, status) VALUES ($1, 'active')
             RETURNING id, started_at, ended_at, status",
        )
        .bind(started_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn get_or_create_player(&mut self, name: &str) -> Result<PlayerModel, AppError> {
        sqlx::query_as::<_, PlayerModel>(
            "INSERT INTO players (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn add_participant(
        &mut self,
        game_id: i64,
        player_id: i64,
        order_index: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO game_players (game_id, player_id, order_index) VALUES ($1, $2, $3)",
        )
        .bind(game_id)
        .bind(player_id)
        .bind(order_index)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn upsert_score(
        &mut self,
        game_id: i64,
        player_id: i64,
        category: Category,
        value: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO scores (game_id, player_id, category, value) VALUES ($1, $2, $3, $4)
             ON CONFLICT (game_id, player_id, category) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(game_id)
        .bind(player_id)
        .bind(category.as_str())
        .bind(value)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn mark_finished(
        &mut self,
        game_id: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE games SET status = 'finished', ended_at = $1 WHERE id = $2 AND status = 'active'",
        )
        .bind(ended_at)
        .bind(game_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            warn!(game_id, "Game was not active when marking finished");
            return Err(GameError::AlreadyFinished.into());
        }
        Ok(())
    }

    async fn append_highscore(&mut self, highscore: &NewHighscore) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO highscores (player_name, score, achieved_at) VALUES ($1, $2, $3)",
        )
        .bind(&highscore.player_name)
        .bind(highscore.score)
        .bind(highscore.achieved_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(db_error)
    }
}
