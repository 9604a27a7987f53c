//! Room roster payloads.

use serde::{Deserialize, Serialize};

/// One entry in a room roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUser {
    /// Display name of a connected member
    pub display_name: String,
}

impl RoomUser {
    /// Roster entry for `display_name`.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into() }
    }
}

/// `roomUsers`: full roster of a room, sent whenever membership changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsers {
    /// Room the roster belongs to
    pub room: String,
    /// Current members
    pub users: Vec<RoomUser>,
}
