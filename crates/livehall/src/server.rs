//! `LiveHallServer` builder and server loop.
//!
//! This is the entry point for running a LiveHall lobby. It ties together
//! all the layers: HTTP transport → protocol → session → room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use livehall_room::{RoomManager, RoomStore};
use livehall_session::IdentityResolver;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::router;
use crate::{LiveHallError, ServerConfig};

/// Shared server state handed to every request.
pub(crate) struct AppState<S: RoomStore, I: IdentityResolver> {
    pub(crate) rooms: RoomManager<S, I>,
}

/// Builder for configuring and starting a LiveHall server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use livehall::prelude::*;
///
/// # async fn run() -> Result<(), LiveHallError> {
/// let server = LiveHallServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryRoomStore::new(), Arc::new(MemoryUserDirectory::new()))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LiveHallServerBuilder {
    bind_addr: String,
}

impl LiveHallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Creates a builder from a loaded [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new().bind(&config.bind_addr)
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and wires the router over `store` and `identities`.
    pub async fn build<S, I>(
        self,
        store: S,
        identities: Arc<I>,
    ) -> Result<LiveHallServer, LiveHallError>
    where
        S: RoomStore,
        I: IdentityResolver,
    {
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let state = Arc::new(AppState {
            rooms: RoomManager::new(store, identities),
        });
        let router = router(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        Ok(LiveHallServer { listener, router })
    }
}

impl Default for LiveHallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound LiveHall server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct LiveHallServer {
    listener: TcpListener,
    router: Router,
}

impl LiveHallServer {
    /// Creates a new builder.
    pub fn builder() -> LiveHallServerBuilder {
        LiveHallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), LiveHallError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "LiveHall server running");

        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Serves requests until `shutdown` completes, then drains in-flight
    /// requests and returns.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), LiveHallError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "LiveHall server running");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("LiveHall server stopped");
        Ok(())
    }
}
