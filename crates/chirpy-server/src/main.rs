mod cleanup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chirpy_api::{AppState, AppStateInner};
use chirpy_auth::SessionService;
use chirpy_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirpy=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CHIRPY_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let polka_key = std::env::var("CHIRPY_POLKA_KEY").unwrap_or_else(|_| "dev-polka-key".into());
    let db_path = std::env::var("CHIRPY_DB_PATH").unwrap_or_else(|_| "database.json".into());
    let static_dir = std::env::var("CHIRPY_STATIC_DIR").unwrap_or_else(|_| ".".into());
    let host = std::env::var("CHIRPY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CHIRPY_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;
    let reset_db = std::env::var("CHIRPY_RESET_DB")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let cleanup_interval_secs: u64 = std::env::var("CHIRPY_TOKEN_CLEANUP_SECS")
        .unwrap_or_else(|_| "3600".into())
        .parse()?;

    if jwt_secret == "dev-secret-change-me" {
        warn!("CHIRPY_JWT_SECRET not set, using the development secret");
    }

    // Init database
    let db_path = PathBuf::from(&db_path);
    let db = if reset_db {
        Database::create(&db_path)?
    } else {
        Database::open(&db_path)?
    };
    let db = Arc::new(db);

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        sessions: SessionService::new(db.clone(), &jwt_secret),
        polka_key,
    });

    // 0 disables pruning
    if cleanup_interval_secs > 0 {
        tokio::spawn(cleanup::run_cleanup_loop(db, cleanup_interval_secs));
    }

    // Routes
    let app = chirpy_api::router(state)
        .nest_service("/app", ServeDir::new(&static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Chirpy server listening on {} (static files from {})", addr, static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
