use knuffelboard::{
    app_router,
    game::repository::{GameRepository, InMemoryGameRepository, PostgresGameRepository},
    AppConfig, AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knuffelboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Kniffel scoreboard server");

    let config = AppConfig::from_env()?;

    let game_repository: Arc<dyn GameRepository> = match &config.database_url {
        Some(database_url) => {
            let repository = PostgresGameRepository::connect(database_url).await?;
            repository.migrate().await?;
            info!("Using PostgreSQL storage");
            Arc::new(repository)
        }
        None => {
            warn!("DATABASE_URL not set, games are kept in memory and lost on restart");
            Arc::new(InMemoryGameRepository::new())
        }
    };

    let app = app_router(AppState::new(game_repository));

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!("Server running on http://{}", config.listen_addr());
    axum::serve(listener, app).await?;

    Ok(())
}
