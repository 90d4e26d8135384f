//! services/dashboard/src/bin/dashboard.rs

use dashboard_core::{
    domain::UserId, PlaylistCatalog, Services, SnapshotStore, Store, SystemClock,
};
use dashboard_lib::{
    adapters::{
        DbAdapter, JsonFileSnapshotStore, LightScheduleAdapter, NewsFeedAdapter, NoteCipher,
        SensorCommunityAdapter,
    },
    config::Config,
    error::AppError,
    refresh::{run_persister, Refresher},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded: {:?}", config);

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(
        db_pool,
        NoteCipher::new(config.encryption_passphrase.as_str()),
    ));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Feed Adapters ---
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let air_quality = Arc::new(SensorCommunityAdapter::new(
        http.clone(),
        config.air_quality_url.clone(),
        config.http_timeout,
    ));
    let light = Arc::new(LightScheduleAdapter::new(
        http.clone(),
        config.light_schedule_url.clone(),
        config.light_street.clone(),
        config.light_house_number.clone(),
    ));
    let news = Arc::new(NewsFeedAdapter::new(
        http,
        config.newsdata_api_key.clone(),
        config.http_timeout,
    ));
    if config.newsdata_api_key.is_none() {
        warn!("NEWSDATA_API_KEY is not set; the NewsData feed will stay empty");
    }

    // --- 4. Build the Store & Restore the Last Snapshot ---
    let clock = Arc::new(SystemClock);
    let store = Arc::new(Store::with_defaults(Services {
        air_quality,
        facts: db_adapter.clone(),
        light,
        news,
        notes: db_adapter,
        clock: clock.clone(),
        playlists: Arc::new(PlaylistCatalog::builtin()),
    }));

    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(JsonFileSnapshotStore::new(config.snapshot_path.clone()));
    if let Err(e) = store.restore_from(snapshots.as_ref()) {
        warn!("Could not read the saved snapshot, starting from defaults: {}", e);
    }

    // --- 5. Spawn the Background Workers ---
    let cancellation_token = CancellationToken::new();
    let persister = tokio::spawn(run_persister(
        store.clone(),
        snapshots.clone(),
        cancellation_token.clone(),
    ));
    let refresher = Refresher::new(store.clone(), clock, UserId::new(config.user_id.clone()));
    let refresh_loop = tokio::spawn(refresher.run(config.refresh_tick, cancellation_token.clone()));

    // --- 6. Wait for Shutdown ---
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested.");
    cancellation_token.cancel();
    for (name, task) in [("persister", persister), ("refresh loop", refresh_loop)] {
        if let Err(e) = task.await {
            error!("The {} task ended abnormally: {}", name, e);
        }
    }

    store.persist_to(snapshots.as_ref())?;
    info!("Final snapshot saved to {}", config.snapshot_path.display());
    Ok(())
}
