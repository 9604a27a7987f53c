//! CBOR-encoded event payloads.
//!
//! Headers are raw binary, payloads are CBOR: self-describing, compact, and
//! derived straight from `serde`. The opcode in the header identifies the
//! payload type, so only the inner struct is serialized (no variant tag).
//!
//! # Invariants
//!
//! Each [`Payload`] variant maps to exactly one [`Opcode`] (enforced by match
//! exhaustiveness).

pub mod chat;
pub mod room;

use bytes::BufMut;
use serde::de::DeserializeOwned;

pub use chat::{ChatMessage, JoinRoom, Message};
pub use room::{RoomUser, RoomUsers};

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All event payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Client joins a room
    JoinRoom(JoinRoom),
    /// Client sends chat text
    ChatMessage(ChatMessage),
    /// Relay delivers a chat line or notice
    Message(Message),
    /// Relay delivers a room roster
    RoomUsers(RoomUsers),
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::JoinRoom(_) => Opcode::JoinRoom,
            Self::ChatMessage(_) => Opcode::ChatMessage,
            Self::Message(_) => Opcode::Message,
            Self::RoomUsers(_) => Opcode::RoomUsers,
        }
    }

    /// Encode the inner struct as CBOR into `dst`.
    ///
    /// Size limits are enforced later by [`Frame::encode`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        let result = match self {
            Self::JoinRoom(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::ChatMessage(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Message(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::RoomUsers(inner) => ciborium::ser::into_writer(inner, &mut writer),
        };

        result.map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode CBOR `bytes` as the payload type for `opcode`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborDecode` if the bytes are not a valid payload for
    ///   this opcode (including missing fields)
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        let payload = match opcode {
            Opcode::JoinRoom => Self::JoinRoom(from_cbor(bytes)?),
            Opcode::ChatMessage => Self::ChatMessage(from_cbor(bytes)?),
            Opcode::Message => Self::Message(from_cbor(bytes)?),
            Opcode::RoomUsers => Self::RoomUsers(from_cbor(bytes)?),
        };

        Ok(payload)
    }

    /// Encode into a transport frame with the matching opcode.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    /// - `ProtocolError::PayloadTooLarge` if the encoded payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;

        let max = FrameHeader::MAX_PAYLOAD_SIZE as usize;
        if buf.len() > max {
            return Err(ProtocolError::PayloadTooLarge { size: buf.len(), max });
        }

        Ok(Frame::new(FrameHeader::new(self.opcode()), buf))
    }

    /// Parse the typed payload out of a frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the header opcode is unassigned
    /// - `ProtocolError::CborDecode` if the payload does not decode
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or_else(|| ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}
