mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use mpj_api::middleware::AuthConfig;
use mpj_api::service::JournalService;
use mpj_api::{AppStateInner, router};
use mpj_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mpj=debug,mpj_api=debug,mpj_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database; the handle lives for the whole process
    let db = Arc::new(Database::open(&config.db_path, config.busy_timeout)?);

    let state = Arc::new(AppStateInner {
        service: JournalService::new(db, config.query_timeout),
    });
    let auth = Arc::new(AuthConfig {
        secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let app = router(state, auth)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("myPrayerJournal API listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
