//! `Server` builder and accept loop.
//!
//! This is the entry point for running a tablero server. It ties the
//! layers together: transport → protocol → registries → per-connection
//! handler.

use std::sync::Arc;

use tablero_protocol::JsonCodec;
use tablero_room::RoomRegistry;
use tablero_session::ConnectionRegistry;
use tablero_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::upkeep::{spawn_upkeep, UpkeepConfig};
use crate::ServerError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// registries live behind one mutex each; every lock scope is short and
/// never spans a network await. When both are needed, rooms is locked
/// before connections, never nested inside it.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) connections: Mutex<ConnectionRegistry>,
    pub(crate) codec: JsonCodec,
}

impl ServerState {
    pub(crate) fn new() -> Self {
        Self {
            rooms: Mutex::new(RoomRegistry::new()),
            connections: Mutex::new(ConnectionRegistry::new()),
            codec: JsonCodec,
        }
    }
}

/// Builder for configuring and starting a tablero server.
///
/// # Example
///
/// ```rust,no_run
/// use tablero::Server;
///
/// # async fn run() -> Result<(), tablero::ServerError> {
/// let server = Server::builder().bind("127.0.0.1:8080").build().await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    upkeep: UpkeepConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            upkeep: UpkeepConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the maintenance configuration (stats and reaper cadence).
    pub fn upkeep_config(mut self, config: UpkeepConfig) -> Self {
        self.upkeep = config;
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<Server, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        Ok(Server {
            transport,
            state: Arc::new(ServerState::new()),
            upkeep: self.upkeep,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running tablero server.
///
/// Call [`run()`](Self::run) to start the maintenance tasks and accept
/// connections.
pub struct Server {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    upkeep: UpkeepConfig,
}

impl Server {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the two periodic maintenance tasks, then accepts incoming
    /// connections and spawns a handler task for each. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        spawn_upkeep(Arc::clone(&self.state), self.upkeep.clone());
        tracing::info!("tablero server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
