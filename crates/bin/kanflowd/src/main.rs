//! # kanflowd — kanflow daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize structured logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct the automation engine, mirror synchronizer and dispatcher
//! - Build the axum router, injecting the dispatcher handle and services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT), draining queued events
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use kanflow_adapter_http_axum::router;
use kanflow_adapter_http_axum::state::AppState;
use kanflow_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteAuditLog, SqliteAutomationRuleRepository,
    SqliteBoardRepository, SqliteCardRepository, SqliteMirrorRuleRepository,
    SqlitePlacementRepository,
};
use kanflow_app::action_executor::ActionExecutor;
use kanflow_app::automation_engine::AutomationEngine;
use kanflow_app::card_events::CardEventHandler;
use kanflow_app::dispatcher::Dispatcher;
use kanflow_app::mirror_sync::MirrorSynchronizer;
use kanflow_app::services::rule_service::RuleService;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).context("parsing log filter")?,
        )
        .init();

    // Database
    let mut db_config = StorageConfig::new(config.database_url());
    db_config.max_connections = config.database.max_connections;
    let db = db_config.build().await.context("opening database")?;
    let pool = db.pool().clone();

    // Repositories
    let boards = SqliteBoardRepository::new(pool.clone());
    let cards = SqliteCardRepository::new(pool.clone());
    let placements = SqlitePlacementRepository::new(pool.clone());
    let rules = SqliteAutomationRuleRepository::new(pool.clone());
    let mirror_rules = SqliteMirrorRuleRepository::new(pool.clone());
    let audit = SqliteAuditLog::new(pool);

    // Engine
    let executor = ActionExecutor::new(
        boards.clone(),
        cards.clone(),
        placements.clone(),
        audit.clone(),
    );
    let engine = AutomationEngine::new(rules.clone(), executor);
    let mirrors = MirrorSynchronizer::new(
        mirror_rules.clone(),
        boards,
        cards,
        placements,
        audit.clone(),
    );
    let handler = CardEventHandler::new(engine, mirrors);

    let (dispatcher, handle) = Dispatcher::new(handler, config.dispatcher_config());
    let worker = tokio::spawn(dispatcher.run());

    // HTTP
    let state = AppState::new(
        handle,
        RuleService::new(rules, mirror_rules),
        audit,
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "kanflowd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last dispatcher handle; the worker drains what is
    // left in the queue and stops.
    worker.await.context("dispatcher task panicked")?;
    tracing::info!("kanflowd stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
