//! `RoomcodeServer` builder and server loop.
//!
//! This is the entry point for running a Roomcode server. It ties
//! together the layers: HTTP → protocol → allocator.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use roomcode_alloc::{Allocator, AllocatorConfig};
use roomcode_protocol::JsonCodec;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{handler, RoomcodeError, ServerConfig};

/// Shared server state passed to each request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// allocator does its own locking.
pub(crate) struct ServerState {
    pub(crate) allocator: Allocator,
    pub(crate) codec: JsonCodec,
}

/// Builds the router for the given state.
///
/// Unmatched paths go to `static_dir` when set, otherwise 404.
fn build_router(state: Arc<ServerState>, static_dir: Option<PathBuf>) -> Router {
    let routes = Router::new()
        .route("/room/gen_code", get(handler::gen_code))
        .route("/room/create", post(handler::create_room))
        .route("/room/close", post(handler::close_room))
        .route("/health", get(handler::health));

    let routes = match static_dir {
        Some(dir) => routes.fallback_service(ServeDir::new(dir)),
        None => routes.fallback(handler::not_found),
    };

    routes.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Builder for configuring and starting a Roomcode server.
///
/// # Example
///
/// ```rust,ignore
/// use roomcode::prelude::*;
///
/// let server = RoomcodeServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RoomcodeServerBuilder {
    bind_addr: String,
    allocator_config: AllocatorConfig,
    allocator: Option<Allocator>,
    static_dir: Option<PathBuf>,
}

impl RoomcodeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            allocator_config: AllocatorConfig::default(),
            allocator: None,
            static_dir: None,
        }
    }

    /// Creates a builder from loaded configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut builder = Self::new()
            .bind(&config.bind_address())
            .allocator_config(config.allocator_config());
        if let Some(dir) = &config.static_dir {
            builder = builder.static_dir(dir.clone());
        }
        builder
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the allocator configuration.
    pub fn allocator_config(mut self, config: AllocatorConfig) -> Self {
        self.allocator_config = config;
        self
    }

    /// Uses an existing allocator instead of building one.
    ///
    /// Lets tests inspect allocator state while the server runs.
    pub fn allocator(mut self, allocator: Allocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Serves files from `dir` for paths no route matches.
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<RoomcodeServer, RoomcodeError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let allocator = self
            .allocator
            .unwrap_or_else(|| Allocator::new(self.allocator_config));

        let state = Arc::new(ServerState {
            allocator: allocator.clone(),
            codec: JsonCodec,
        });
        let router = build_router(state, self.static_dir);

        Ok(RoomcodeServer {
            listener,
            router,
            allocator,
        })
    }
}

impl Default for RoomcodeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Roomcode server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct RoomcodeServer {
    listener: TcpListener,
    router: Router,
    allocator: Allocator,
}

impl RoomcodeServer {
    /// Creates a new builder.
    pub fn builder() -> RoomcodeServerBuilder {
        RoomcodeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle to the server's allocator.
    pub fn allocator(&self) -> Allocator {
        self.allocator.clone()
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), RoomcodeError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `shutdown` completes, then drains in-flight
    /// requests and returns.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RoomcodeError> {
        let addr = self.listener.local_addr()?;
        let config = self.allocator.config();
        tracing::info!(
            %addr,
            pool_size = config.pool_size,
            reclaim_after_ms = config.reclaim_after.as_millis() as u64,
            "Roomcode server running"
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Roomcode server stopped");
        Ok(())
    }
}
