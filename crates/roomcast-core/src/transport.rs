//! Transport seam and action executor.
//!
//! The router decides *what* to send; a [`Transport`] knows *how*. Runtimes
//! implement the four primitives below over their own connections and
//! broadcast groups. Room membership for broadcast lives in the transport,
//! the registry never tracks it twice.

use std::future::Future;

use roomcast_proto::Frame;

use crate::{
    error::TransportError,
    presence::ConnectionId,
    router::{LogLevel, RouterAction},
};

/// Outbound primitives a runtime exposes to the relay.
///
/// Broadcasts are best-effort per recipient: a member whose connection fails
/// is skipped and the rest still receive the frame. Broadcasting to an empty
/// or unknown room is a no-op.
pub trait Transport: Send + Sync {
    /// Send `frame` to a single connection.
    fn emit(
        &self,
        connection_id: ConnectionId,
        frame: &Frame,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send `frame` to every member of `room`.
    fn broadcast_to_room(
        &self,
        room: &str,
        frame: &Frame,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send `frame` to every member of `room` except `exclude`.
    fn broadcast_to_room_excluding(
        &self,
        room: &str,
        exclude: ConnectionId,
        frame: &Frame,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Add a connection to `room`'s broadcast group.
    fn join_group(
        &self,
        connection_id: ConnectionId,
        room: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Execute router actions against `transport`, in order.
///
/// Failures are logged and do not stop later actions: one dead connection
/// must not keep the rest of a room from hearing about it.
pub async fn execute_actions<T: Transport>(transport: &T, actions: Vec<RouterAction>) {
    for action in actions {
        let result = match action {
            RouterAction::Emit { connection_id, frame } => {
                transport.emit(connection_id, &frame).await
            },
            RouterAction::JoinGroup { connection_id, room } => {
                transport.join_group(connection_id, &room).await
            },
            RouterAction::BroadcastToRoom { room, frame, exclude: None } => {
                transport.broadcast_to_room(&room, &frame).await
            },
            RouterAction::BroadcastToRoom { room, frame, exclude: Some(exclude) } => {
                transport.broadcast_to_room_excluding(&room, exclude, &frame).await
            },
            RouterAction::Log { level, message } => {
                log(level, &message);
                Ok(())
            },
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "transport action failed");
        }
    }
}

/// Forward a router diagnostic to `tracing`.
fn log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!("{}", message),
        LogLevel::Info => tracing::info!("{}", message),
        LogLevel::Warn => tracing::warn!("{}", message),
        LogLevel::Error => tracing::error!("{}", message),
    }
}
