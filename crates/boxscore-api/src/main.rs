//! Boxscore API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use boxscore_api::error::AppError;
use boxscore_api::{routes, state};
use boxscore_store::redis_cache::RedisCache;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting boxscore API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let redis_url = std::env::var("REDIS_URL")
        .map_err(|_| AppError::Config("REDIS_URL environment variable must be set".into()))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create database connection pool and run migrations.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Config(format!("migration failed: {e}")))?;

    // Connect the identity cache.
    let cache = Arc::new(RedisCache::connect(&redis_url).await?);

    // Build application state.
    let app_state = state::AppState::new(pool, cache);

    // Build router.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/games", routes::games::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/teams", routes::teams::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
