mod api;
mod middleware;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use leadscope_enrich::{EnrichmentService, ServiceConfig};
use leadscope_github::GithubClient;
use leadscope_webscan::PageClient;

use crate::api::{build_app, AppState};
use crate::worker::{spawn_workers, WorkerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = leadscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = leadscope_db::PoolConfig::from_app_config(&config);
    let pool = leadscope_db::connect_pool(&config.database_url, pool_config).await?;
    leadscope_db::run_migrations(&pool).await?;

    let github = GithubClient::new(
        config.github_token.as_deref(),
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
    )?;
    let pages = PageClient::new(config.fetch_timeout_secs, &config.fetch_user_agent)?;
    let service = Arc::new(EnrichmentService::new(
        github,
        pages,
        ServiceConfig::from_app_config(&config),
    ));

    let worker_ctx = WorkerContext {
        pool: pool.clone(),
        service,
        poll_interval: Duration::from_millis(config.worker_poll_interval_ms),
        stale_after_secs: config.job_stale_after_secs,
    };
    let _workers = spawn_workers(config.worker_count, &worker_ctx);

    let app = build_app(AppState { pool });

    tracing::info!(addr = %config.bind_addr, workers = config.worker_count, "leadscope server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
