//! Wire format for the roomcast chat relay.
//!
//! Every event crossing the transport is a [`Frame`]: a fixed 16-byte binary
//! [`FrameHeader`] followed by a CBOR-encoded payload. The header carries the
//! [`Opcode`] so the relay can dispatch an event before touching the payload
//! bytes.
//!
//! # Components
//!
//! - [`FrameHeader`]: zero-copy fixed header (magic, version, opcode, size)
//! - [`Frame`]: header plus raw payload bytes
//! - [`Payload`]: typed events, one variant per opcode
//! - [`ProtocolError`]: framing and payload decoding failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod frame;
mod header;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::Payload;

/// ALPN identifier negotiated on every QUIC connection.
pub const ALPN_PROTOCOL: &[u8] = b"roomcast/1";
