//! Roomcast core logic.
//!
//! Everything here is I/O-free. Runtimes (the QUIC server, the turmoil
//! simulation) feed [`RouterEvent`]s into a [`ChatRouter`] and execute the
//! [`RouterAction`]s it returns against a [`Transport`].
//!
//! # Components
//!
//! - [`PresenceRegistry`]: which connection is in which room under which name
//! - [`ChatRouter`]: join / message / disconnect flows
//! - [`Transport`]: the emit and broadcast primitives a runtime provides
//! - [`Environment`]: wall clock and randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod error;
pub mod message;
pub mod presence;
mod router;
mod transport;

pub use env::Environment;
pub use error::{RouterError, TransportError};
pub use presence::{ConnectionId, ConnectionRecord, PresenceRegistry};
pub use router::{ChatRouter, LogLevel, RouterAction, RouterConfig, RouterEvent};
pub use transport::{Transport, execute_actions};
