//! Broadcast groups: which live connections hear a room's broadcasts.
//!
//! Two mappings: room → connections (for broadcast) and connection → room
//! (for cleanup on disconnect). A connection belongs to at most one group.
//!
//! Groups exist only while they have members. Removing the last member of a
//! room drops the room entry.

use std::collections::{HashMap, HashSet};

use roomcast_core::ConnectionId;

/// Room subscriptions for live connections.
#[derive(Debug, Default)]
pub struct BroadcastGroups {
    /// Room name → member connections
    members: HashMap<String, HashSet<ConnectionId>>,
    /// Connection → the room it belongs to
    rooms: HashMap<ConnectionId, String>,
}

impl BroadcastGroups {
    /// Create an empty set of groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room's group, moving it out of any other room.
    ///
    /// Returns `false` if it was already a member of `room`.
    pub fn join_group(&mut self, connection_id: ConnectionId, room: &str) -> bool {
        if self.rooms.get(&connection_id).is_some_and(|current| current == room) {
            return false;
        }

        self.remove_connection(connection_id);
        self.members.entry(room.to_string()).or_default().insert(connection_id);
        self.rooms.insert(connection_id, room.to_string());
        true
    }

    /// Remove a connection from its group.
    ///
    /// Returns the room it was removed from, if any.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<String> {
        let room = self.rooms.remove(&connection_id)?;

        if let Some(members) = self.members.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.members.remove(&room);
            }
        }

        Some(room)
    }

    /// All connections in a room's group. Empty for unknown rooms.
    pub fn members(&self, room: &str) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.get(room).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Number of connections in a room's group.
    pub fn member_count(&self, room: &str) -> usize {
        self.members.get(room).map_or(0, HashSet::len)
    }
}
