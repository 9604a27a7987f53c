//! Simulation server for testing with turmoil.
//!
//! `SimServer` runs a [`ChatRouter`] behind turmoil's deterministic TCP. One
//! event loop owns the router; a reader task per connection forwards decoded
//! frames to it over a channel, so events are processed strictly one at a
//! time and a connection's disconnect always follows its last frame.

use std::{collections::HashMap, io};

use roomcast_core::{
    ChatRouter, ConnectionId, Environment, RouterConfig, RouterEvent, Transport, TransportError,
    execute_actions,
};
use roomcast_proto::Frame;
use roomcast_server::{BroadcastGroups, read_frame, write_frame};
use tokio::{
    io::{ReadHalf, WriteHalf},
    sync::{Mutex, mpsc},
};
use turmoil::net::{TcpListener, TcpStream};

use crate::SimEnv;

/// Simulated relay server.
pub struct SimServer {
    listener: TcpListener,
    router: ChatRouter<SimEnv>,
    env: SimEnv,
}

impl SimServer {
    /// Bind with a default environment and router config.
    pub async fn bind(address: &str) -> io::Result<Self> {
        Self::bind_with(address, SimEnv::new(), RouterConfig::default()).await
    }

    /// Bind with a specific environment and router config.
    pub async fn bind_with(address: &str, env: SimEnv, config: RouterConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let router = ChatRouter::new(env.clone(), config);

        Ok(Self { listener, router, env })
    }

    /// Accept connections and relay frames until the simulation ends.
    pub async fn run(mut self) -> io::Result<()> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let transport = SimTransport::default();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, addr) = accepted?;
                    let connection_id = transport.allocate_id(&self.env).await;
                    let (reader, writer) = tokio::io::split(stream);

                    transport.writers.lock().await.insert(connection_id, writer);
                    tokio::spawn(read_loop(connection_id, reader, events_tx.clone()));

                    tracing::debug!(%connection_id, %addr, "sim connection accepted");
                },
                Some(event) = events_rx.recv() => {
                    if let RouterEvent::Disconnected { connection_id } = &event {
                        transport.remove_connection(*connection_id).await;
                    }

                    match self.router.process_event(event) {
                        Ok(actions) => execute_actions(&transport, actions).await,
                        Err(e) => tracing::warn!(error = %e, "frame rejected"),
                    }
                },
            }
        }
    }

    /// Underlying router for assertions.
    pub fn router(&self) -> &ChatRouter<SimEnv> {
        &self.router
    }
}

/// Forward frames from one connection until it ends, then report the close.
async fn read_loop(
    connection_id: ConnectionId,
    mut reader: ReadHalf<TcpStream>,
    events: mpsc::UnboundedSender<RouterEvent>,
) {
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(frame)) => {
                if events.send(RouterEvent::FrameReceived { connection_id, frame }).is_err() {
                    return;
                }
            },
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "sim stream failed");
                break;
            },
        }
    }

    let _ = events.send(RouterEvent::Disconnected { connection_id });
}

/// Writer halves and broadcast groups for simulated connections.
#[derive(Default)]
struct SimTransport {
    writers: Mutex<HashMap<ConnectionId, WriteHalf<TcpStream>>>,
    groups: Mutex<BroadcastGroups>,
}

impl SimTransport {
    async fn allocate_id(&self, env: &SimEnv) -> ConnectionId {
        let writers = self.writers.lock().await;
        loop {
            let candidate = ConnectionId::new(env.random_u64());
            if !writers.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    async fn remove_connection(&self, connection_id: ConnectionId) {
        self.writers.lock().await.remove(&connection_id);
        self.groups.lock().await.remove_connection(connection_id);
    }

    async fn send(&self, connection_id: ConnectionId, frame: &Frame) -> Result<(), TransportError> {
        let mut writers = self.writers.lock().await;
        let writer = writers
            .get_mut(&connection_id)
            .ok_or(TransportError::ConnectionNotFound(connection_id))?;

        write_frame(writer, frame)
            .await
            .map_err(|e| TransportError::SendFailed { connection_id, reason: e.to_string() })
    }

    async fn broadcast(&self, room: &str, exclude: Option<ConnectionId>, frame: &Frame) {
        let members: Vec<ConnectionId> =
            self.groups.lock().await.members(room).filter(|id| Some(*id) != exclude).collect();

        for connection_id in members {
            if let Err(e) = self.send(connection_id, frame).await {
                tracing::warn!(%connection_id, %room, error = %e, "sim broadcast delivery failed");
            }
        }
    }
}

impl Transport for SimTransport {
    async fn emit(&self, connection_id: ConnectionId, frame: &Frame) -> Result<(), TransportError> {
        self.send(connection_id, frame).await
    }

    async fn broadcast_to_room(&self, room: &str, frame: &Frame) -> Result<(), TransportError> {
        self.broadcast(room, None, frame).await;
        Ok(())
    }

    async fn broadcast_to_room_excluding(
        &self,
        room: &str,
        exclude: ConnectionId,
        frame: &Frame,
    ) -> Result<(), TransportError> {
        self.broadcast(room, Some(exclude), frame).await;
        Ok(())
    }

    async fn join_group(
        &self,
        connection_id: ConnectionId,
        room: &str,
    ) -> Result<(), TransportError> {
        if !self.writers.lock().await.contains_key(&connection_id) {
            return Err(TransportError::ConnectionNotFound(connection_id));
        }

        let mut groups = self.groups.lock().await;
        groups.join_group(connection_id, room);
        let members = groups.member_count(room);
        tracing::debug!(%connection_id, %room, members, "sim joined group");
        Ok(())
    }
}
