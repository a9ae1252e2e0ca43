use std::sync::Arc;

use ledger_api::api::router::create_router;
use ledger_api::config::AppConfig;
use ledger_api::db::{warmup, Database};
use ledger_api::{metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let metrics_handle = metrics::init_metrics();
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let mut db = Database::connect(
        &config.database_url,
        config.read_pool_size,
        config.write_pool_size,
    )
    .await?;

    // Warm-up (and its destructive reset) must finish before the listener
    // binds; afterwards the facade is shared and can no longer be reset.
    if config.warmup_enabled {
        warmup::run(&mut db).await?;
        tracing::info!("Warm-up complete");
    }

    let state = AppState {
        db: Arc::new(db),
        config,
        metrics_handle,
    };
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain every pool once in-flight requests are done.
    state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
