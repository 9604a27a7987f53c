//! Event opcodes.

/// Event kind carried in the frame header.
///
/// Inbound opcodes are sent by clients, outbound opcodes only by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Client asks to join a room (`joinRoom`)
    JoinRoom,
    /// Client sends chat text to its room (`chatMessage`)
    ChatMessage,
    /// Relay delivers a chat line or system notice (`message`)
    Message,
    /// Relay delivers the current roster of a room (`roomUsers`)
    RoomUsers,
}

impl Opcode {
    /// Decode a raw opcode. `None` if unassigned.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::JoinRoom),
            0x0002 => Some(Self::ChatMessage),
            0x0010 => Some(Self::Message),
            0x0011 => Some(Self::RoomUsers),
            _ => None,
        }
    }

    /// Raw wire value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::JoinRoom => 0x0001,
            Self::ChatMessage => 0x0002,
            Self::Message => 0x0010,
            Self::RoomUsers => 0x0011,
        }
    }

    /// Whether clients are allowed to send this opcode.
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        matches!(self, Self::JoinRoom | Self::ChatMessage)
    }

    /// Event name used by browser-style clients.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::JoinRoom => "joinRoom",
            Self::ChatMessage => "chatMessage",
            Self::Message => "message",
            Self::RoomUsers => "roomUsers",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_round_trip_through_wire_value() {
        for opcode in [Opcode::JoinRoom, Opcode::ChatMessage, Opcode::Message, Opcode::RoomUsers] {
            assert_eq!(Opcode::from_u16(opcode.to_u16()), Some(opcode));
        }
    }

    #[test]
    fn unassigned_values_are_rejected() {
        assert_eq!(Opcode::from_u16(0x0000), None);
        assert_eq!(Opcode::from_u16(0x0003), None);
        assert_eq!(Opcode::from_u16(0xFFFF), None);
    }

    #[test]
    fn only_client_events_are_inbound() {
        assert!(Opcode::JoinRoom.is_inbound());
        assert!(Opcode::ChatMessage.is_inbound());
        assert!(!Opcode::Message.is_inbound());
        assert!(!Opcode::RoomUsers.is_inbound());
    }
}
