//! Presence registry: which connection is in which room under which name.
//!
//! The registry is the only state the relay keeps. A record exists for a
//! connection if and only if it has joined a room and not yet disconnected.
//! Records have two states (absent, present) and two transitions
//! ([`PresenceRegistry::join`], [`PresenceRegistry::leave`]); a record's room
//! never changes.
//!
//! `lookup` and `leave` are O(1) by connection. `list_by_room` scans every
//! record.

use std::{collections::HashMap, fmt};

use roomcast_proto::payloads::RoomUser;

/// Opaque, transport-assigned identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One active chat participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Connection this record belongs to (primary key)
    pub connection_id: ConnectionId,
    /// Name chosen at join time. Not unique, not validated.
    pub display_name: String,
    /// Room joined. Immutable for the record's lifetime.
    pub room: String,
    /// Position in join order, used to order rosters
    joined_seq: u64,
}

impl ConnectionRecord {
    /// Roster entry for this participant.
    #[must_use]
    pub fn roster_entry(&self) -> RoomUser {
        RoomUser::new(self.display_name.clone())
    }
}

/// In-memory mapping from connection to [`ConnectionRecord`].
///
/// Constructed empty and owned by whoever routes events; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    records: HashMap<ConnectionId, ConnectionRecord>,
    next_seq: u64,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new record and return it.
    ///
    /// The caller guarantees `connection_id` is not already present; the
    /// transport never hands out the same identifier to two live connections
    /// and [`crate::ChatRouter`] ignores repeated joins.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        room: impl Into<String>,
    ) -> ConnectionRecord {
        debug_assert!(
            !self.records.contains_key(&connection_id),
            "join called twice for connection {connection_id}"
        );

        let record = ConnectionRecord {
            connection_id,
            display_name: display_name.into(),
            room: room.into(),
            joined_seq: self.next_seq,
        };
        self.next_seq += 1;

        self.records.insert(connection_id, record.clone());
        record
    }

    /// Remove and return the record for `connection_id`.
    ///
    /// `None` if the connection never joined or already left. That is an
    /// expected outcome, not an error.
    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<ConnectionRecord> {
        self.records.remove(&connection_id)
    }

    /// Record for `connection_id`, if it has joined and not left.
    pub fn lookup(&self, connection_id: ConnectionId) -> Option<&ConnectionRecord> {
        self.records.get(&connection_id)
    }

    /// Roster of `room` in join order. Empty (never absent) for a room with
    /// no members.
    pub fn list_by_room(&self, room: &str) -> Vec<RoomUser> {
        let mut members: Vec<&ConnectionRecord> =
            self.records.values().filter(|record| record.room == room).collect();
        members.sort_unstable_by_key(|record| record.joined_seq);
        members.into_iter().map(ConnectionRecord::roster_entry).collect()
    }

    /// Number of active records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no connection has an active record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> ConnectionId {
        ConnectionId::new(raw)
    }

    fn names(users: &[RoomUser]) -> Vec<&str> {
        users.iter().map(|u| u.display_name.as_str()).collect()
    }

    #[test]
    fn join_then_list_room() {
        let mut registry = PresenceRegistry::new();

        let record = registry.join(id(1), "alice", "general");
        assert_eq!(record.display_name, "alice");
        assert_eq!(record.room, "general");

        assert_eq!(names(&registry.list_by_room("general")), vec!["alice"]);
    }

    #[test]
    fn leave_removes_member_from_roster() {
        let mut registry = PresenceRegistry::new();

        registry.join(id(1), "alice", "general");
        registry.join(id(2), "bob", "general");
        registry.leave(id(1));

        assert_eq!(names(&registry.list_by_room("general")), vec!["bob"]);
    }

    #[test]
    fn leave_unknown_connection_is_none() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(1), "alice", "general");

        assert!(registry.leave(id(99)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn leave_twice_returns_record_then_none() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(1), "alice", "general");

        let first = registry.leave(id(1)).unwrap();
        assert_eq!(first.display_name, "alice");
        assert!(registry.leave(id(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_is_read_only() {
        let mut registry = PresenceRegistry::new();
        assert!(registry.lookup(id(1)).is_none());

        registry.join(id(1), "alice", "general");
        let record = registry.lookup(id(1)).unwrap();
        assert_eq!(record.room, "general");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_room_lists_nothing() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(1), "alice", "general");

        assert!(registry.list_by_room("random").is_empty());
    }

    #[test]
    fn rooms_are_separate() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(1), "alice", "room1");
        registry.join(id(2), "bob", "room2");

        assert_eq!(names(&registry.list_by_room("room1")), vec!["alice"]);
        assert_eq!(names(&registry.list_by_room("room2")), vec!["bob"]);
    }

    #[test]
    fn roster_follows_join_order() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(30), "carol", "general");
        registry.join(id(10), "alice", "general");
        registry.join(id(20), "bob", "general");

        assert_eq!(names(&registry.list_by_room("general")), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn duplicate_names_and_empty_strings_are_kept() {
        let mut registry = PresenceRegistry::new();
        registry.join(id(1), "alice", "");
        registry.join(id(2), "alice", "");
        registry.join(id(3), "", "");

        assert_eq!(names(&registry.list_by_room("")), vec!["alice", "alice", ""]);
    }

    #[test]
    fn connection_id_displays_as_hex() {
        assert_eq!(id(0xdead_beef).to_string(), "00000000deadbeef");
    }
}
