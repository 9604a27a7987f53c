//! Deterministic simulation harness for the Roomcast relay.
//!
//! Turmoil-based runtime for [`roomcast_core::ChatRouter`]: simulated TCP in
//! place of QUIC, a seeded RNG for connection identifiers, and a clock the
//! test controls. The same router code runs here and in production.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_client;
pub mod sim_env;
pub mod sim_server;

pub use sim_client::SimClient;
pub use sim_env::SimEnv;
pub use sim_server::SimServer;
