//! Property-based tests for broadcast groups.
//!
//! Random join/remove sequences are applied to `BroadcastGroups` and to a
//! plain connection → room model; the two must always agree.

use std::collections::BTreeMap;

use proptest::prelude::*;
use roomcast_core::ConnectionId;
use roomcast_server::BroadcastGroups;

const ROOMS: [&str; 3] = ["general", "random", "ops"];

#[derive(Debug, Clone)]
enum Op {
    Join(u64, usize),
    Remove(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u64..6, 0..ROOMS.len()).prop_map(|(id, room)| Op::Join(id, room)),
        1 => (0u64..6).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn groups_match_single_room_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut groups = BroadcastGroups::new();
        let mut model: BTreeMap<u64, &str> = BTreeMap::new();

        for op in &ops {
            match *op {
                Op::Join(id, room) => {
                    let added = groups.join_group(ConnectionId::new(id), ROOMS[room]);
                    let previous = model.insert(id, ROOMS[room]);
                    prop_assert_eq!(added, previous != Some(ROOMS[room]));
                },
                Op::Remove(id) => {
                    let removed = groups.remove_connection(ConnectionId::new(id));
                    prop_assert_eq!(removed.as_deref(), model.remove(&id));
                },
            }
        }

        for room in ROOMS {
            let mut actual: Vec<u64> = groups.members(room).map(|c| c.get()).collect();
            actual.sort_unstable();
            let expected: Vec<u64> =
                model.iter().filter(|(_, r)| **r == room).map(|(c, _)| *c).collect();
            prop_assert_eq!(groups.member_count(room), expected.len());
            prop_assert_eq!(actual, expected);
        }
    }
}
