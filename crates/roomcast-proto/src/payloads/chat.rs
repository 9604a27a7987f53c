//! Chat payloads: joining a room and exchanging text.

use serde::{Deserialize, Serialize};

/// `joinRoom`: a client picks a display name and a room.
///
/// Neither field is validated; empty strings and duplicate names are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    /// Display name chosen by the client
    pub username: String,
    /// Room to join
    pub room: String,
}

/// `chatMessage`: text a client wants delivered to its room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message body
    pub text: String,
}

/// `message`: a chat line or system notice delivered by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Display name of the sender, or the bot identity for notices
    pub sender_name: String,
    /// Message body
    pub text: String,
    /// Wall-clock time the relay stamped the message, e.g. `9:05 pm`
    pub timestamp: String,
}
