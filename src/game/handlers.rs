use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::GameService,
    types::{
        AdjustBonusRequest, BonusUpdateResponse, FinishResponse, GameView, RecordScoreRequest,
        ScoreUpdateResponse, StartGameRequest, StartGameResponse,
    },
};
use crate::shared::{AppError, AppState};

/// HTTP handler for starting a new game
///
/// POST /api/games
#[instrument(name = "start_game", skip(state, payload))]
pub async fn start_game(
    State(state): State<AppState>,
    payload: Result<Json<StartGameRequest>, JsonRejection>,
) -> Result<Json<StartGameResponse>, AppError> {
    let Json(request) = payload?;
    let names = request.players.into_names()?;

    let service = GameService::new(Arc::clone(&state.game_repository));
    let game = service.start_game(&names).await?;

    info!(game_id = game.id, "Game created");

    Ok(Json(game))
}

/// GET /api/games/:id
#[instrument(name = "get_game", skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<GameView>, AppError> {
    let service = GameService::new(Arc::clone(&state.game_repository));
    Ok(Json(service.get_game(game_id).await?))
}

/// HTTP handler for recording one category value
///
/// POST /api/games/:id/score
#[instrument(name = "record_score", skip(state, payload))]
pub async fn record_score(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    payload: Result<Json<RecordScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    let Json(request) = payload?;
    let service = GameService::new(Arc::clone(&state.game_repository));
    let update = service.record_score_entry(game_id, request).await?;

    Ok(Json(update))
}

/// POST /api/games/:id/kniffel-bonus
#[instrument(name = "adjust_kniffel_bonus", skip(state, payload))]
pub async fn adjust_kniffel_bonus(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    payload: Result<Json<AdjustBonusRequest>, JsonRejection>,
) -> Result<Json<BonusUpdateResponse>, AppError> {
    let Json(request) = payload?;
    let service = GameService::new(Arc::clone(&state.game_repository));
    let update = service
        .adjust_kniffel_bonus(game_id, request.player_id, request.delta)
        .await?;

    Ok(Json(update))
}

/// HTTP handler for finishing a game
///
/// POST /api/games/:id/finish
/// Returns the ranking; highscores are written in the same transaction
#[instrument(name = "finish_game", skip(state))]
pub async fn finish_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<FinishResponse>, AppError> {
    let service = GameService::new(Arc::clone(&state.game_repository));
    let finished = service.finish_game(game_id).await?;

    info!(
        game_id,
        players = finished.ranking.len(),
        "Game finished successfully"
    );

    Ok(Json(finished))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::repository::InMemoryGameRepository;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn app(repo: Arc<InMemoryGameRepository>) -> Router {
        let app_state = AppStateBuilder::new().with_game_repository(repo).build();
        Router::new()
            .route("/games", post(start_game))
            .route("/games/:id", get(get_game))
            .route("/games/:id/score", post(record_score))
            .route("/games/:id/kniffel-bonus", post(adjust_kniffel_bonus))
            .route("/games/:id/finish", post(finish_game))
            .with_state(app_state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_start_game_handler() {
        let app = app(Arc::new(InMemoryGameRepository::new()));

        let (status, json) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({"players": ["Ann", "Bo"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "active");
        assert_eq!(json["players"][1]["name"], "Bo");
        assert_eq!(json["players"][1]["order_index"], 1);
    }

    #[tokio::test]
    async fn test_start_game_handler_rejects_empty_list() {
        let app = app(Arc::new(InMemoryGameRepository::new()));

        let (status, json) =
            send(&app, "POST", "/games", Some(serde_json::json!({"players": []}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_start_game_handler_rejects_malformed_players() {
        let app = app(Arc::new(InMemoryGameRepository::new()));

        for body in [
            serde_json::json!({"players": "Ann"}),
            serde_json::json!({"players": ["Ann", null]}),
            serde_json::json!({"players": [1, 2]}),
            serde_json::json!({}),
            serde_json::json!(["Ann"]),
        ] {
            let (status, json) = send(&app, "POST", "/games", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["kind"], "invalid_input");
        }
    }

    #[tokio::test]
    async fn test_get_unknown_game_is_404() {
        let app = app(Arc::new(InMemoryGameRepository::new()));

        let (status, json) = send(&app, "GET", "/games/77", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_score_then_view() {
        let app = app(Arc::new(InMemoryGameRepository::new()));
        let (_, game) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({"players": ["Ann"]})),
        )
        .await;
        let id = game["id"].as_i64().unwrap();
        let ann = game["players"][0]["id"].as_i64().unwrap();

        let (status, update) = send(
            &app,
            "POST",
            &format!("/games/{}/score", id),
            Some(serde_json::json!({"player_id": ann, "category": "fives", "value": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(update["ok"], true);
        assert_eq!(update["allFilled"], false);
        assert_eq!(update["computed"][ann.to_string()]["upper"], 20);

        let (status, view) = send(&app, "GET", &format!("/games/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["scores"][ann.to_string()]["fives"], 20);
        assert!(view["scores"][ann.to_string()].get("sixes").is_none());
    }

    #[tokio::test]
    async fn test_score_with_fractional_value_is_invalid() {
        let app = app(Arc::new(InMemoryGameRepository::new()));
        let (_, game) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({"players": ["Ann"]})),
        )
        .await;
        let id = game["id"].as_i64().unwrap();
        let ann = game["players"][0]["id"].as_i64().unwrap();

        let (status, json) = send(
            &app,
            "POST",
            &format!("/games/{}/score", id),
            Some(serde_json::json!({"player_id": ann, "category": "chance", "value": 12.5})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_value");
    }

    #[tokio::test]
    async fn test_kniffel_bonus_requires_kniffel() {
        let app = app(Arc::new(InMemoryGameRepository::new()));
        let (_, game) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({"players": ["Ann"]})),
        )
        .await;
        let id = game["id"].as_i64().unwrap();
        let ann = game["players"][0]["id"].as_i64().unwrap();
        let uri = format!("/games/{}/kniffel-bonus", id);

        let (status, json) = send(
            &app,
            "POST",
            &uri,
            Some(serde_json::json!({"player_id": ann, "delta": 50})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_value");

        send(
            &app,
            "POST",
            &format!("/games/{}/score", id),
            Some(serde_json::json!({"player_id": ann, "category": "kniffel", "value": 50})),
        )
        .await;
        let (status, json) = send(
            &app,
            "POST",
            &uri,
            Some(serde_json::json!({"player_id": ann, "delta": 50})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["kniffel_bonus"], 50);
    }

    #[tokio::test]
    async fn test_finish_incomplete_game() {
        let app = app(Arc::new(InMemoryGameRepository::new()));
        let (_, game) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({"players": ["Ann"]})),
        )
        .await;
        let id = game["id"].as_i64().unwrap();

        let (status, json) = send(&app, "POST", &format!("/games/{}/finish", id), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "incomplete_scoresheet");
    }
}
