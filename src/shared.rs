use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::game::repository::GameRepository;
use crate::game::GameError;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub game_repository: Arc<dyn GameRepository>,
}

impl AppState {
    pub fn new(game_repository: Arc<dyn GameRepository>) -> Self {
        Self { game_repository }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable discriminator reported alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Game(err) => err.kind(),
            AppError::NotFound(_) => "not_found",
            AppError::DatabaseError(_) => "database_error",
            AppError::Internal => "internal",
        }
    }
}

// Bodies that are not JSON of the expected shape
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Game(GameError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_message) = match self {
            AppError::Game(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
