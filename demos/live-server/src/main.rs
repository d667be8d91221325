//! LiveHall lobby server binary.
//!
//! Configuration comes from the environment (see `ServerConfig`). With the
//! `postgres` feature and `DATABASE_URL` set, users and rooms are stored in
//! PostgreSQL; otherwise everything lives in memory.

use std::sync::Arc;

use anyhow::Context;
use livehall::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    let builder = LiveHallServerBuilder::from_config(&config);

    let server = match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .context("connecting to PostgreSQL")?;

            let users = PgUserDirectory::new(pool.clone());
            users.ensure_schema().await.context("creating user schema")?;
            let rooms = PgRoomStore::new(pool);
            rooms.ensure_schema().await.context("creating room schema")?;

            info!("using PostgreSQL storage");
            builder.build(rooms, Arc::new(users)).await
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            warn!("DATABASE_URL is set but the postgres feature is disabled; using in-memory storage");
            builder
                .build(MemoryRoomStore::new(), Arc::new(MemoryUserDirectory::new()))
                .await
        }
        None => {
            info!("using in-memory storage");
            builder
                .build(MemoryRoomStore::new(), Arc::new(MemoryUserDirectory::new()))
                .await
        }
    }
    .context("binding server")?;

    info!(addr = %server.local_addr()?, "starting server");
    server
        .run_until(shutdown_signal())
        .await
        .context("serving LiveHall")?;

    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
