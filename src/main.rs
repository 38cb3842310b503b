use std::sync::Arc;

use chrono::Utc;
use eisenmatrix::{api, config, db::app_storage::AppStorage, state::AppState};
use log::{debug, info, warn};
use tokio::{net::TcpListener, time};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::AppConfig::from_env()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting application with config:");
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Database path: {}", config.database_root_path);
    info!("  Days when urgent: {}", config.days_when_urgent);
    info!("  Rescore interval: {}s", config.rescore_interval_secs);

    let app_storage = AppStorage::new(&config.database_root_path)?;
    let (categories, tasks) = app_storage.get_stats();
    info!("Loaded {} categories and {} tasks", categories, tasks);

    let shared_state = Arc::new(AppState::new(app_storage, config.clone()));

    let app = api::router(shared_state.clone());

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server starting on http://{}", bind_address);

    if config.rescore_interval_secs > 0 {
        let state = shared_state.clone();
        tokio::spawn(async move {
            let mut interval =
                time::interval(time::Duration::from_secs(state.config.rescore_interval_secs));
            loop {
                interval.tick().await;
                match state
                    .storage
                    .rescore_open_tasks(Utc::now(), state.config.days_when_urgent)
                {
                    Ok(summary) => debug!(
                        "Periodic rescore: {} open tasks, {} changed",
                        summary.rescored, summary.changed
                    ),
                    Err(e) => warn!("Periodic rescore failed: {}", e),
                }
            }
        });
    }

    axum::serve(listener, app).await?;

    Ok(())
}
