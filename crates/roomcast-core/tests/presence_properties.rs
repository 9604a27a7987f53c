//! Property-based tests for the presence registry
//!
//! Random join/leave sequences are applied both to `PresenceRegistry` and to a
//! plain map model; after every step the two must agree.

use std::collections::HashMap;

use proptest::prelude::*;
use roomcast_core::{ConnectionId, PresenceRegistry};

const ROOMS: [&str; 3] = ["general", "random", ""];

#[derive(Debug, Clone)]
enum Op {
    Join { id: u64, name: String, room: usize },
    Leave { id: u64 },
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    // Small id space so joins and leaves collide often
    prop_oneof![
        (0u64..8, "[a-c]{0,3}", 0..ROOMS.len()).prop_map(|(id, name, room)| Op::Join {
            id,
            name,
            room
        }),
        (0u64..8).prop_map(|id| Op::Leave { id }),
    ]
}

/// Apply `ops` to a fresh registry, skipping joins for ids already present.
fn run(ops: &[Op]) -> (PresenceRegistry, HashMap<u64, (String, &'static str)>) {
    let mut registry = PresenceRegistry::new();
    let mut model: HashMap<u64, (String, &'static str)> = HashMap::new();

    for op in ops {
        match op {
            Op::Join { id, name, room } => {
                if model.contains_key(id) {
                    continue;
                }
                registry.join(ConnectionId::new(*id), name.clone(), ROOMS[*room]);
                model.insert(*id, (name.clone(), ROOMS[*room]));
            },
            Op::Leave { id } => {
                let removed = registry.leave(ConnectionId::new(*id));
                let expected = model.remove(id);
                assert_eq!(removed.is_some(), expected.is_some());
            },
        }
    }

    (registry, model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: lookup finds a record iff the last operation on that id was a join
    #[test]
    fn prop_lookup_iff_last_op_was_join(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
        let (registry, model) = run(&ops);

        for id in 0u64..8 {
            let record = registry.lookup(ConnectionId::new(id));
            match model.get(&id) {
                Some((name, room)) => {
                    let record = record.expect("joined id must be present");
                    prop_assert_eq!(&record.display_name, name);
                    prop_assert_eq!(record.room.as_str(), *room);
                },
                None => prop_assert!(record.is_none()),
            }
        }
        prop_assert_eq!(registry.len(), model.len());
    }

    /// Property: list_by_room returns exactly the members of that room
    #[test]
    fn prop_list_by_room_matches_model(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
        let (registry, model) = run(&ops);

        for room in ROOMS {
            let mut listed: Vec<String> =
                registry.list_by_room(room).into_iter().map(|u| u.display_name).collect();
            let mut expected: Vec<String> = model
                .values()
                .filter(|(_, r)| *r == room)
                .map(|(name, _)| name.clone())
                .collect();

            listed.sort();
            expected.sort();
            prop_assert_eq!(listed, expected);
        }

        prop_assert!(registry.list_by_room("no-such-room").is_empty());
    }

    /// Property: leave on an id that never joined changes nothing
    #[test]
    fn prop_leave_unknown_is_noop(ops in prop::collection::vec(arbitrary_op(), 0..32)) {
        let (mut registry, model) = run(&ops);
        let before = registry.len();

        // ids >= 8 are never generated
        prop_assert!(registry.leave(ConnectionId::new(1_000)).is_none());
        prop_assert_eq!(registry.len(), before);
        prop_assert_eq!(registry.len(), model.len());
    }

    /// Property: leaving twice yields the record once, then nothing
    #[test]
    fn prop_second_leave_is_none(
        ops in prop::collection::vec(arbitrary_op(), 0..32),
        name in "[a-z]{1,8}",
    ) {
        let (mut registry, _) = run(&ops);
        let id = ConnectionId::new(500);

        registry.join(id, name.clone(), "general");
        let first = registry.leave(id).expect("just joined");
        prop_assert_eq!(first.display_name, name);
        prop_assert!(registry.leave(id).is_none());
    }
}
