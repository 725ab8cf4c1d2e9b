use anyhow::{Context, Result};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;

mod config;
mod data;
mod features;
mod handlers;
mod schema;
mod utils;

use config::AppConfig;
use features::revision::RevisionService;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    log::info!("Starting with {:?}", config);

    let pool = data::build_pool(&config.database_url, config.pool_size)
        .context("Failed to create DB pool")?;
    let service = RevisionService::new(pool, config.max_write_retries);

    if config.sweep_interval_secs > 0 {
        spawn_overdue_sweep(service.clone(), config.sweep_interval_secs);
    }

    let app = Router::new().nest("/api", handlers::revision::revision_router(service));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Periodically logs how many overdue revisions each owner has
fn spawn_overdue_sweep(service: RevisionService, every_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs));
        loop {
            ticker.tick().await;
            let service = service.clone();
            match tokio::task::spawn_blocking(move || service.overdue_summary(utils::now())).await {
                Ok(Ok(summary)) => {
                    for owner in &summary {
                        log::info!(
                            "Owner {} has {} overdue revisions",
                            owner.owner_id,
                            owner.overdue_count
                        );
                    }
                }
                Ok(Err(e)) => log::error!("Overdue sweep failed: {}", e),
                Err(e) => log::error!("Overdue sweep task panicked: {}", e),
            }
        }
    });
}
