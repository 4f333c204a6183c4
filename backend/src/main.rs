use axum::{
    http::{header, Method, StatusCode},
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod clients;
mod config;
mod db;
pub mod error;
mod handlers;
mod intelligence;
mod models;
mod schema;
mod sync;

use config::AppConfig;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let port = config.port;

    // Establish database connection pool
    let pool = db::establish_connection_pool()?;

    let state = AppState { pool, config };

    let app = Router::new()
        .route("/health", get(health_check))
        // Account routes
        .route("/api/accounts", get(handlers::list_accounts))
        .route("/api/accounts", post(handlers::start_google_oauth))
        .route("/api/accounts/:id", delete(handlers::delete_account))
        // OAuth routes
        .route(
            "/api/accounts/oauth/callback",
            get(handlers::google_oauth_callback),
        )
        // Calendar sync
        .route("/api/accounts/:id/sync", post(handlers::sync_account))
        // Meeting routes
        .route("/api/meetings", get(handlers::list_meetings))
        .route("/api/meetings/:id", get(handlers::get_meeting))
        .route(
            "/api/meetings/:id/prep",
            post(handlers::generate_meeting_prep),
        )
        .route(
            "/api/meetings/:id/transcript",
            post(handlers::import_transcript),
        )
        .route(
            "/api/meetings/:id/action-items",
            post(handlers::extract_action_items),
        )
        .route(
            "/api/meetings/:id/followup",
            post(handlers::compose_followup),
        )
        // Email routes
        .route("/api/emails", get(handlers::list_emails))
        .layer(build_cors_layer())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Build CORS layer based on environment configuration.
///
/// If CORS_ALLOWED_ORIGINS is set, only those origins are allowed.
/// If not set, defaults to permissive CORS (for development only).
fn build_cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok();

    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true)
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
