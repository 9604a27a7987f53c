//! Server error types.

use std::fmt;

use roomcast_core::RouterError;

/// Errors that can occur in the server runtime.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (invalid bind address, unreadable TLS files, etc.).
    ///
    /// Fatal: prevents startup. Fix configuration and restart.
    Config(String),

    /// Transport/network error (accept failure, stream I/O, etc.).
    ///
    /// Usually scoped to one connection; the server keeps serving others.
    Transport(String),

    /// A peer sent bytes that are not a valid frame.
    ///
    /// Fatal for that stream, the server continues serving other clients.
    Protocol(String),

    /// Internal error (unexpected state). Indicates a bug.
    Internal(String),

    /// Router rejected an event.
    ///
    /// Scoped to a single frame. See `RouterError` for details.
    Router(RouterError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Router(err) => write!(f, "router error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Router(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RouterError> for ServerError {
    fn from(err: RouterError) -> Self {
        Self::Router(err)
    }
}

impl From<roomcast_proto::ProtocolError> for ServerError {
    fn from(err: roomcast_proto::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
