use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use neonflow_api::auth::{self, AppState, AppStateInner};
use neonflow_api::middleware::{require_super_admin, require_user};
use neonflow_api::{channels, generate, posts, publish, stats};
use neonflow_telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neonflow=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
    if bot_token.is_empty() {
        warn!("TELEGRAM_BOT_TOKEN is not set; authentication and channel calls will fail");
    }
    let super_admin_id = std::env::var("SUPER_ADMIN_TELEGRAM_ID").unwrap_or_default();
    let allow_test_auth = std::env::var("ALLOW_TEST_AUTH").is_ok_and(|v| v == "true");
    let db_path = std::env::var("NEONFLOW_DB_PATH").unwrap_or_else(|_| "neonflow.db".into());
    let host = std::env::var("NEONFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NEONFLOW_PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()?;

    // Init database
    let db = neonflow_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let telegram = TelegramClient::new(bot_token.clone())?;
    let state: AppState = Arc::new(AppStateInner {
        db,
        telegram,
        bot_token,
        super_admin_id,
        allow_test_auth,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/telegram", post(auth::telegram_auth))
        .route("/health", get(health))
        .with_state(state.clone());

    let user_routes = Router::new()
        .route("/channels", get(channels::list_channels))
        .route("/channels/connect", post(channels::connect_channel))
        .route("/posts", get(posts::list_posts))
        .route("/generate/text", post(generate::generate_text))
        .layer(middleware::from_fn_with_state(state.clone(), require_user))
        .with_state(state.clone());

    // require_user is the outer layer, so the super-admin gate sees the
    // resolved identity.
    let admin_routes = Router::new()
        .route("/publish", post(publish::publish))
        .route("/stats", get(stats::stats))
        .layer(middleware::from_fn(require_super_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_user))
        .with_state(state);

    let api = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes);

    let app = Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("NeonFlow server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
