//! diy-troubleshooter - HTTP server for the troubleshooting assistant.
//!
//! Configuration is read from `TROUBLESHOOTER__*` environment variables
//! (see [`AppConfig::load`]). Without `TROUBLESHOOTER__DATABASE__URL` the
//! server keeps sessions and workflows in memory.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use diy_troubleshooter::adapters::http::{build_router, RouterOptions};
use diy_troubleshooter::adapters::postgres::{PostgresSessionStore, PostgresWorkflowSource};
use diy_troubleshooter::adapters::storage::{InMemorySessionStore, InMemoryWorkflowSource};
use diy_troubleshooter::bootstrap::{build_http_state, load_catalogue, Interpretation};
use diy_troubleshooter::config::{AppConfig, DatabaseConfig};
use diy_troubleshooter::ports::{SessionStore, WorkflowSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config);

    config.validate().context("invalid configuration")?;

    let (store, source) = build_storage(&config.database).await?;
    let catalogue = load_catalogue(source.as_ref(), config.engine.seed_builtin_workflows)
        .await
        .context("failed to load workflow catalogue")?;
    let interpretation = Interpretation::from_config(&config.engine, &config.ai)?;

    tracing::info!(
        mode = ?config.engine.interpretation_mode,
        workflows = catalogue.len(),
        "Session engine ready"
    );

    let state = build_http_state(
        store,
        Arc::new(catalogue),
        interpretation,
        config.engine.max_message_chars,
    );
    let options = RouterOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = build_router(state, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("diy-troubleshooter listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_storage(
    database: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn SessionStore>, Arc<dyn WorkflowSource>)> {
    let Some(url) = database.url() else {
        tracing::warn!("No database configured; sessions are kept in memory");
        return Ok((
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryWorkflowSource::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .idle_timeout(database.idle_timeout())
        .connect(url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Connected to database");

    if database.run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        tracing::info!("Migrations applied");
    }

    Ok((
        Arc::new(PostgresSessionStore::new(pool.clone())),
        Arc::new(PostgresWorkflowSource::new(pool)),
    ))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
