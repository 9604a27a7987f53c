//! Error types for the relay core.
//!
//! Unknown connections have no variant: a message or disconnect from a
//! connection that never joined is a no-op, not an error.

use roomcast_proto::{Opcode, ProtocolError};
use thiserror::Error;

use crate::presence::ConnectionId;

/// Errors from [`crate::ChatRouter`] event processing.
///
/// Every variant concerns a single inbound event. Runtimes log them and keep
/// the connection open; registry state is never modified on error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Frame or payload could not be decoded or encoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Client sent an event only the relay may send
    #[error("unexpected {} event from connection {connection_id}", .opcode.event_name())]
    UnexpectedEvent {
        /// Sending connection
        connection_id: ConnectionId,
        /// Outbound-only opcode it used
        opcode: Opcode,
    },

    /// Wall clock cannot be rendered as a calendar time
    #[error("wall clock {0} is outside the supported calendar range")]
    InvalidTimestamp(u64),
}

/// Errors from [`crate::Transport`] primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Target connection is no longer open
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Writing to an open connection failed
    #[error("send failed for connection {connection_id}: {reason}")]
    SendFailed {
        /// Connection that failed
        connection_id: ConnectionId,
        /// Error message
        reason: String,
    },

    /// Frame could not be encoded for the wire
    #[error("encode error: {0}")]
    Encode(#[from] ProtocolError),
}
