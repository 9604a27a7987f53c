//! Event router.
//!
//! Translates connection events into [`PresenceRegistry`] calls and outbound
//! actions. The router performs no I/O: it returns [`RouterAction`]s for a
//! runtime to execute in order (see [`crate::execute_actions`]).
//!
//! ```text
//! transport ──RouterEvent──> ChatRouter ──> PresenceRegistry
//!     ^                          │
//!     └─────RouterAction─────────┘
//! ```
//!
//! Events for one router must be processed one at a time. Each call runs to
//! completion before the next, so registry mutations are atomic with respect
//! to every other registry operation.

use roomcast_proto::{
    Frame, Payload,
    payloads::{ChatMessage, JoinRoom, RoomUsers},
};

use crate::{
    env::Environment,
    error::RouterError,
    message::{self, BOT_NAME, WELCOME_TEXT},
    presence::{ConnectionId, ConnectionRecord, PresenceRegistry},
};

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Sender name for system notices
    pub bot_name: String,
    /// Greeting emitted to a connection after it joins
    pub welcome_text: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { bot_name: BOT_NAME.to_string(), welcome_text: WELCOME_TEXT.to_string() }
    }
}

/// Events the router consumes, produced by the runtime.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// A frame arrived on a connection
    FrameReceived {
        /// Connection that sent the frame
        connection_id: ConnectionId,
        /// The received frame
        frame: Frame,
    },

    /// A connection closed (by peer or error). Carries no payload.
    Disconnected {
        /// Connection that closed
        connection_id: ConnectionId,
    },
}

/// Actions the router produces, executed by the runtime in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Send a frame to a single connection
    Emit {
        /// Target connection
        connection_id: ConnectionId,
        /// Frame to send
        frame: Frame,
    },

    /// Subscribe a connection to a room's broadcast group
    JoinGroup {
        /// Connection to subscribe
        connection_id: ConnectionId,
        /// Room whose group it joins
        room: String,
    },

    /// Send a frame to every connection in a room's broadcast group
    BroadcastToRoom {
        /// Target room
        room: String,
        /// Frame to broadcast
        frame: Frame,
        /// Connection to leave out, if any
        exclude: Option<ConnectionId>,
    },

    /// Diagnostic message; never reaches a client
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

impl RouterAction {
    /// Whether this action delivers an event to at least one client.
    #[must_use]
    pub fn is_outbound(&self) -> bool {
        matches!(self, Self::Emit { .. } | Self::BroadcastToRoom { .. })
    }
}

/// Log levels for router diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Sans-IO chat router.
///
/// Owns the [`PresenceRegistry`]; nothing else mutates it.
#[derive(Debug)]
pub struct ChatRouter<E: Environment> {
    presence: PresenceRegistry,
    config: RouterConfig,
    env: E,
}

impl<E: Environment> ChatRouter<E> {
    /// Create a router with an empty registry.
    pub fn new(env: E, config: RouterConfig) -> Self {
        Self { presence: PresenceRegistry::new(), config, env }
    }

    /// Current presence state.
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Environment the router stamps messages with.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Process one event and return the actions to execute.
    ///
    /// # Errors
    ///
    /// - `RouterError::Protocol` if the frame's payload does not decode
    /// - `RouterError::UnexpectedEvent` if a client sent an outbound-only event
    /// - `RouterError::InvalidTimestamp` if the wall clock cannot be rendered
    ///
    /// A join that fails is rolled back. A disconnect always removes the
    /// record, even if the notices for the room cannot be encoded.
    pub fn process_event(&mut self, event: RouterEvent) -> Result<Vec<RouterAction>, RouterError> {
        match event {
            RouterEvent::FrameReceived { connection_id, frame } => {
                if let Some(opcode) = frame.header.opcode_enum()
                    && !opcode.is_inbound()
                {
                    return Err(RouterError::UnexpectedEvent { connection_id, opcode });
                }

                match Payload::from_frame(&frame)? {
                    Payload::JoinRoom(join) => self.on_join(connection_id, join),
                    Payload::ChatMessage(chat) => self.on_message(connection_id, chat),
                    other @ (Payload::Message(_) | Payload::RoomUsers(_)) => {
                        Err(RouterError::UnexpectedEvent { connection_id, opcode: other.opcode() })
                    },
                }
            },
            RouterEvent::Disconnected { connection_id } => self.on_disconnect(connection_id),
        }
    }

    /// `joinRoom`: register the connection, subscribe it to the room, welcome
    /// it, tell the rest of the room, and send everyone the new roster.
    ///
    /// A repeated join from an already-joined connection is ignored, so a
    /// connection stays in the room it joined first.
    pub fn on_join(
        &mut self,
        connection_id: ConnectionId,
        join: JoinRoom,
    ) -> Result<Vec<RouterAction>, RouterError> {
        if let Some(existing) = self.presence.lookup(connection_id) {
            return Ok(vec![RouterAction::Log {
                level: LogLevel::Warn,
                message: format!(
                    "connection {connection_id} already joined room {:?}, ignoring join to {:?}",
                    existing.room, join.room
                ),
            }]);
        }

        let record = self.presence.join(connection_id, join.username, join.room);

        let (welcome, joined, roster) = match self.join_frames(&record) {
            Ok(frames) => frames,
            Err(e) => {
                self.presence.leave(connection_id);
                return Err(e);
            },
        };

        Ok(vec![
            RouterAction::Log {
                level: LogLevel::Info,
                message: format!(
                    "connection {connection_id} joined room {:?} as {:?}",
                    record.room, record.display_name
                ),
            },
            RouterAction::JoinGroup { connection_id, room: record.room.clone() },
            RouterAction::Emit { connection_id, frame: welcome },
            RouterAction::BroadcastToRoom {
                room: record.room.clone(),
                frame: joined,
                exclude: Some(connection_id),
            },
            RouterAction::BroadcastToRoom { room: record.room, frame: roster, exclude: None },
        ])
    }

    /// `chatMessage`: deliver the text to everyone in the sender's room,
    /// sender included. Silently dropped if the sender never joined.
    pub fn on_message(
        &self,
        connection_id: ConnectionId,
        chat: ChatMessage,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let Some(record) = self.presence.lookup(connection_id) else {
            return Ok(vec![RouterAction::Log {
                level: LogLevel::Debug,
                message: format!("dropping message from connection {connection_id}: not in a room"),
            }]);
        };

        let message =
            message::format_message(&record.display_name, chat.text, self.env.wall_clock_secs())?;
        let frame = Payload::Message(message).into_frame()?;

        Ok(vec![RouterAction::BroadcastToRoom { room: record.room.clone(), frame, exclude: None }])
    }

    /// `disconnect`: drop the record and tell the remaining room members,
    /// with a fresh roster. Nothing is emitted for a connection that never
    /// joined.
    pub fn on_disconnect(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let Some(record) = self.presence.leave(connection_id) else {
            return Ok(vec![RouterAction::Log {
                level: LogLevel::Debug,
                message: format!("connection {connection_id} closed before joining a room"),
            }]);
        };

        let left = self.bot_frame(message::left_notice(&record.display_name))?;
        let roster = self.roster_frame(&record.room)?;

        Ok(vec![
            RouterAction::Log {
                level: LogLevel::Info,
                message: format!(
                    "connection {connection_id} ({:?}) left room {:?}",
                    record.display_name, record.room
                ),
            },
            RouterAction::BroadcastToRoom { room: record.room.clone(), frame: left, exclude: None },
            RouterAction::BroadcastToRoom { room: record.room, frame: roster, exclude: None },
        ])
    }

    fn join_frames(&self, record: &ConnectionRecord) -> Result<(Frame, Frame, Frame), RouterError> {
        let welcome = self.bot_frame(self.config.welcome_text.clone())?;
        let joined = self.bot_frame(message::joined_notice(&record.display_name))?;
        let roster = self.roster_frame(&record.room)?;
        Ok((welcome, joined, roster))
    }

    fn bot_frame(&self, text: String) -> Result<Frame, RouterError> {
        let message =
            message::format_message(&self.config.bot_name, text, self.env.wall_clock_secs())?;
        Ok(Payload::Message(message).into_frame()?)
    }

    fn roster_frame(&self, room: &str) -> Result<Frame, RouterError> {
        let users = self.presence.list_by_room(room);
        Ok(Payload::RoomUsers(RoomUsers { room: room.to_string(), users }).into_frame()?)
    }
}
