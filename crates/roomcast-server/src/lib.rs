//! Roomcast production server.
//!
//! Wraps [`roomcast_core`]'s I/O-free [`ChatRouter`] with real I/O: Quinn
//! for QUIC transport, Tokio for the async runtime, and the system clock and
//! OS RNG for the environment.
//!
//! # Architecture
//!
//! Every accepted connection gets a random [`ConnectionId`] and one outbound
//! unidirectional stream. Clients send frames on bidirectional streams they
//! open. All router calls go through a single mutex, so events are processed
//! one at a time and each event's actions finish before the next event
//! starts.
//!
//! # Components
//!
//! - [`Server`]: accept loop and per-connection tasks
//! - [`BroadcastGroups`]: room membership for broadcast delivery
//! - [`QuinnTransport`]: QUIC endpoint via Quinn
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod framing;
mod groups;
mod system_env;
mod transport;

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

pub use error::ServerError;
pub use framing::{read_frame, write_all_within, write_frame};
pub use groups::BroadcastGroups;
use roomcast_core::{
    ChatRouter, ConnectionId, Environment, RouterConfig, RouterEvent, Transport, TransportError,
    execute_actions,
};
use roomcast_proto::Frame;
pub use system_env::SystemEnv;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinSet,
};
pub use transport::{QuinnConnection, QuinnTransport};

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:3000")
    pub bind_address: String,
    /// Path to TLS certificate (PEM format)
    pub cert_path: Option<String>,
    /// Path to TLS private key (PEM format)
    pub key_path: Option<String>,
    /// Bot identity used for system messages
    pub router: RouterConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: socket_address("0.0.0.0", 3000),
            cert_path: None,
            key_path: None,
            router: RouterConfig::default(),
        }
    }
}

/// Join a host and port into a bindable address, bracketing IPv6 hosts.
pub fn socket_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Production Roomcast server.
pub struct Server {
    router: ChatRouter<SystemEnv>,
    transport: QuinnTransport,
    env: SystemEnv,
}

impl Server {
    /// Create and bind a new server. Must be called within a Tokio runtime.
    pub fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let router = ChatRouter::new(env.clone(), config.router);

        let transport = QuinnTransport::bind(
            &config.bind_address,
            config.cert_path.as_deref(),
            config.key_path.as_deref(),
        )?;

        Ok(Self { router, transport, env })
    }

    /// Run the server, accepting connections and relaying frames.
    ///
    /// Returns once the endpoint is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(addr = %self.transport.local_addr()?, "server starting");

        let env = self.env;
        let router = Arc::new(Mutex::new(self.router));
        let shared = Arc::new(SharedState::new());

        loop {
            match self.transport.accept().await {
                Ok(Some(conn)) => {
                    let router = Arc::clone(&router);
                    let shared = Arc::clone(&shared);
                    let env = env.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, router, shared, env).await {
                            tracing::error!(error = %e, "connection error");
                        }
                    });
                },
                Ok(None) => {
                    tracing::info!("endpoint closed, server stopping");
                    return Ok(());
                },
                Err(e) => {
                    tracing::warn!(error = %e, "accept error");
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

type SharedRouter = Arc<Mutex<ChatRouter<SystemEnv>>>;

/// Longest a single client may stall an outbound write. Actions run under the
/// router lock, so a client that stops reading must not hold it for longer.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// An open connection and its single outbound stream.
struct ConnectionHandle {
    connection: QuinnConnection,
    /// All frames to a client go through this stream, preserving order.
    outbound: Mutex<quinn::SendStream>,
}

impl ConnectionHandle {
    /// Write `bytes` to the outbound stream. A connection whose write fails
    /// or stalls past [`SEND_TIMEOUT`] is closed, which ends its tasks and
    /// triggers the usual disconnect cleanup.
    async fn send(&self, connection_id: ConnectionId, bytes: &[u8]) -> Result<(), TransportError> {
        let mut stream = self.outbound.lock().await;
        if let Err(e) = write_all_within(&mut *stream, bytes, SEND_TIMEOUT).await {
            self.connection.close(1u32.into(), b"send failed");
            return Err(TransportError::SendFailed { connection_id, reason: e.to_string() });
        }
        Ok(())
    }
}

/// Live connections and their broadcast groups.
///
/// `join_group` holds the connection map's read lock while it updates the
/// groups, and `remove_connection` takes the write lock first, so a closed
/// connection can never be added to a group after its cleanup.
struct SharedState {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    groups: RwLock<BroadcastGroups>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            groups: RwLock::new(BroadcastGroups::new()),
        }
    }

    /// Store a new connection under a fresh random identifier.
    async fn register<E: Environment>(
        &self,
        env: &E,
        connection: QuinnConnection,
        outbound: quinn::SendStream,
    ) -> ConnectionId {
        let mut connections = self.connections.write().await;

        let connection_id = loop {
            let candidate = ConnectionId::new(env.random_u64());
            if !connections.contains_key(&candidate) {
                break candidate;
            }
        };

        connections
            .insert(connection_id, ConnectionHandle { connection, outbound: Mutex::new(outbound) });
        connection_id
    }

    /// Drop a closed connection from the stream map and every group.
    async fn remove_connection(&self, connection_id: ConnectionId) {
        let handle = self.connections.write().await.remove(&connection_id);
        let room = self.groups.write().await.remove_connection(connection_id);

        if let Some(handle) = handle {
            handle.connection.close(0u32.into(), b"closed");
        }

        tracing::debug!(%connection_id, ?room, "connection removed");
    }

    async fn broadcast(
        &self,
        room: &str,
        exclude: Option<ConnectionId>,
        frame: &Frame,
    ) -> Result<(), TransportError> {
        let bytes = frame.to_vec()?;

        let members: Vec<ConnectionId> =
            self.groups.read().await.members(room).filter(|id| Some(*id) != exclude).collect();

        let connections = self.connections.read().await;
        for connection_id in members {
            let Some(handle) = connections.get(&connection_id) else {
                continue;
            };
            if let Err(e) = handle.send(connection_id, &bytes).await {
                tracing::warn!(%connection_id, %room, error = %e, "broadcast delivery failed");
            }
        }

        Ok(())
    }
}

impl Transport for SharedState {
    async fn emit(&self, connection_id: ConnectionId, frame: &Frame) -> Result<(), TransportError> {
        let bytes = frame.to_vec()?;

        let connections = self.connections.read().await;
        let handle = connections
            .get(&connection_id)
            .ok_or(TransportError::ConnectionNotFound(connection_id))?;
        handle.send(connection_id, &bytes).await
    }

    async fn broadcast_to_room(&self, room: &str, frame: &Frame) -> Result<(), TransportError> {
        self.broadcast(room, None, frame).await
    }

    async fn broadcast_to_room_excluding(
        &self,
        room: &str,
        exclude: ConnectionId,
        frame: &Frame,
    ) -> Result<(), TransportError> {
        self.broadcast(room, Some(exclude), frame).await
    }

    async fn join_group(
        &self,
        connection_id: ConnectionId,
        room: &str,
    ) -> Result<(), TransportError> {
        let connections = self.connections.read().await;
        if !connections.contains_key(&connection_id) {
            return Err(TransportError::ConnectionNotFound(connection_id));
        }

        let mut groups = self.groups.write().await;
        groups.join_group(connection_id, room);
        let members = groups.member_count(room);
        tracing::debug!(%connection_id, %room, members, "joined group");
        Ok(())
    }
}

/// Handle a single QUIC connection until it closes.
async fn handle_connection(
    conn: QuinnConnection,
    router: SharedRouter,
    shared: Arc<SharedState>,
    env: SystemEnv,
) -> Result<(), ServerError> {
    let outbound = conn.open_uni().await?;
    let remote = conn.remote_addr();
    let connection_id = shared.register(&env, conn.clone(), outbound).await;

    tracing::info!(%connection_id, %remote, "connection accepted");

    let mut streams = JoinSet::new();
    loop {
        match conn.accept_bi().await {
            Ok((send, recv)) => {
                drop(send);
                streams.spawn(handle_stream(
                    connection_id,
                    recv,
                    Arc::clone(&router),
                    Arc::clone(&shared),
                ));
            },
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "connection closed");
                break;
            },
        }
    }

    // Let in-flight frames finish so the disconnect is the last event
    while streams.join_next().await.is_some() {}

    shared.remove_connection(connection_id).await;

    let mut router = router.lock().await;
    let actions = router.process_event(RouterEvent::Disconnected { connection_id })?;
    execute_actions(shared.as_ref(), actions).await;

    tracing::info!(%connection_id, "connection finished");
    Ok(())
}

/// Read frames from one client stream and feed them to the router.
async fn handle_stream(
    connection_id: ConnectionId,
    mut recv: quinn::RecvStream,
    router: SharedRouter,
    shared: Arc<SharedState>,
) {
    loop {
        let frame = match read_frame(&mut recv).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "stream ended");
                break;
            },
        };

        let mut router = router.lock().await;
        match router.process_event(RouterEvent::FrameReceived { connection_id, frame }) {
            Ok(actions) => execute_actions(shared.as_ref(), actions).await,
            Err(e) => tracing::warn!(%connection_id, error = %e, "frame rejected"),
        }
    }
}
