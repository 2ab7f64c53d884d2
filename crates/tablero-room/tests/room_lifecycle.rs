//! Integration tests for room lifecycle invariants across operation
//! sequences, using only the public registry API.

use tablero_protocol::{Player, RoomCode};
use tablero_room::{RoomError, RoomRegistry};

fn host(name: &str) -> Player {
    Player::new(name, "red", true)
}

fn guest(name: &str) -> Player {
    Player::new(name, "blue", false)
}

#[test]
fn test_membership_never_exceeds_four_across_churn() {
    let mut reg = RoomRegistry::new();
    let code = reg.create_room(host("Ann")).unwrap();

    // Fill the room, then churn: each departure frees exactly one seat.
    let mut members: Vec<_> = (0..3)
        .map(|i| {
            let g = guest(&format!("g{i}"));
            let id = g.id.clone();
            reg.join_room(&code, g).unwrap();
            id
        })
        .collect();

    for round in 0..5 {
        assert!(matches!(
            reg.join_room(&code, guest("overflow")),
            Err(RoomError::RoomFull(_))
        ));
        assert_eq!(reg.members(&code).len(), 4);

        let leaver = members.remove(0);
        reg.leave_room(&leaver).unwrap();
        assert_eq!(reg.members(&code).len(), 3);

        let g = guest(&format!("r{round}"));
        let id = g.id.clone();
        reg.join_room(&code, g).unwrap();
        members.push(id);
    }
}

#[test]
fn test_player_belongs_to_at_most_one_room() {
    let mut reg = RoomRegistry::new();
    let first = reg.create_room(host("Ann")).unwrap();
    let second = reg.create_room(host("Iris")).unwrap();

    let bo = guest("Bo");
    let bo_id = bo.id.clone();
    reg.join_room(&first, bo.clone()).unwrap();

    assert!(matches!(
        reg.join_room(&second, bo),
        Err(RoomError::AlreadyInRoom(_))
    ));
    assert_eq!(reg.player_room(&bo_id), Some(&first));

    // After leaving, the player may join elsewhere.
    reg.leave_room(&bo_id).unwrap();
    let bo_again = guest("Bo");
    reg.join_room(&second, bo_again).unwrap();
}

#[test]
fn test_emptied_room_is_gone_before_the_reaper_runs() {
    let mut reg = RoomRegistry::new();
    let h = host("Ann");
    let host_id = h.id.clone();
    let code = reg.create_room(h).unwrap();

    let g = guest("Bo");
    let guest_id = g.id.clone();
    reg.join_room(&code, g).unwrap();

    reg.leave_room(&guest_id).unwrap();
    assert!(reg.contains(&code), "room survives while occupied");

    reg.leave_room(&host_id).unwrap();
    assert!(!reg.contains(&code), "last leave deletes immediately");
    assert_eq!(reg.room_count(), 0);

    // The code behaves like it never existed.
    assert!(matches!(
        reg.join_room(&code, guest("late")),
        Err(RoomError::NotFound(_))
    ));
    assert!(reg.members(&code).is_empty());
}

#[test]
fn test_codes_are_not_recycled_into_live_collisions() {
    let mut reg = RoomRegistry::new();
    let mut live = std::collections::HashSet::new();

    for i in 0..50 {
        let h = host(&format!("h{i}"));
        let host_id = h.id.clone();
        let code = reg.create_room(h).unwrap();
        assert!(
            live.insert(code.clone()),
            "live room codes must be unique"
        );

        // Drop every third room to mix creation with deletion.
        if i % 3 == 0 {
            reg.leave_room(&host_id).unwrap();
            live.remove(&code);
        }
    }
    assert_eq!(reg.room_count(), live.len());
}

#[test]
fn test_snapshot_reflects_latest_game_state() {
    let mut reg = RoomRegistry::new();
    let code = reg.create_room(host("Ann")).unwrap();
    reg.join_room(&code, guest("Bo")).unwrap();

    reg.apply_dice_roll(&code, 4, 1).unwrap();
    reg.apply_move(&code, vec![serde_json::json!({"id": 0, "cell": 3})], 1)
        .unwrap();

    let snap = reg.snapshot(&code).unwrap();
    assert_eq!(snap.game_state.dice_value, 4);
    assert_eq!(snap.game_state.current_player, 1);
    assert_eq!(snap.game_state.pieces.len(), 1);
    assert_eq!(snap.players.len(), 2);
}

#[test]
fn test_members_of_unknown_room_is_empty() {
    let reg = RoomRegistry::new();
    assert!(reg.members(&RoomCode::new("ABSENT")).is_empty());
    assert!(reg.snapshot(&RoomCode::new("ABSENT")).is_none());
}
