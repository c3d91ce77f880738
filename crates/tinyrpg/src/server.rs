//! `Server` builder and accept loop.
//!
//! This is the entry point for running a session authority. It ties the
//! layers together: transport → protocol → session core.

use std::sync::Arc;
use std::time::Duration;

use tinyrpg_protocol::{Codec, JsonCodec, DEFAULT_PORT};
use tinyrpg_session::{GameSession, ProfessionCatalogue, SessionConfig};
use tinyrpg_transport::{TcpTransport, Transport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
///
/// The single `Mutex<GameSession>` is the concurrency discipline: every
/// mutating operation holds it for the duration of the call, so no
/// connection ever observes a half-applied transition.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: Mutex<GameSession>,
    pub(crate) codec: C,
    pub(crate) request_timeout: Duration,
}

/// Builder for configuring and starting a session authority.
///
/// # Example
///
/// ```rust,no_run
/// use tinyrpg::ServerBuilder;
///
/// # async fn run() -> Result<(), tinyrpg::ServerError> {
/// let server = ServerBuilder::new().bind("0.0.0.0:52000").build().await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    catalogue: Option<Arc<ProfessionCatalogue>>,
    request_timeout: Duration,
    max_frame_len: Option<usize>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings: the standard port,
    /// the built-in profession catalogue, and a request timeout generous
    /// enough for a polling client that only speaks on user input.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            session_config: SessionConfig::default(),
            catalogue: None,
            request_timeout: Duration::from_secs(300),
            max_frame_len: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration (minimum players to start).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replaces the built-in profession catalogue.
    pub fn catalogue(mut self, catalogue: Arc<ProfessionCatalogue>) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    /// Sets how long a connection may sit idle between requests.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the transport's per-frame length cap.
    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = Some(max);
        self
    }

    /// Builds and binds the server. Uses `JsonCodec` over the TCP line
    /// transport.
    pub async fn build(self) -> Result<Server<JsonCodec>, ServerError> {
        let mut transport = TcpTransport::bind(&self.bind_addr).await?;
        if let Some(max) = self.max_frame_len {
            transport = transport.max_frame_len(max);
        }
        let catalogue = self
            .catalogue
            .unwrap_or_else(|| Arc::new(ProfessionCatalogue::builtin()));

        let state = Arc::new(ServerState {
            session: Mutex::new(GameSession::new(
                catalogue,
                self.session_config,
            )),
            codec: JsonCodec,
            request_timeout: self.request_timeout,
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running session authority.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<C: Codec> {
    transport: TcpTransport,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Server<C> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own task: handshake, join, then
    /// the request loop. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("TinyRPG session authority running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
