//! Room registry: creates, tracks, and tears down rooms.
//!
//! # Concurrency note
//!
//! `RoomRegistry` is NOT thread-safe by itself — it is plain owned data,
//! guarded by a single mutex at the server layer. All mutation funnels
//! through the operations here; there is no ambient global state.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tablero_protocol::{
    Player, PlayerId, PublicRoomEntry, RoomCode, RoomSnapshot,
};

use crate::{Room, RoomError};

/// Characters a room code is drawn from.
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a room code.
const CODE_LEN: usize = 6;

/// The result of removing a player from their room.
#[derive(Debug)]
pub struct Departure {
    /// The room the player was removed from.
    pub room_code: RoomCode,
    /// The removed player.
    pub player: Player,
    /// Snapshot of the room after removal, or `None` when the room
    /// emptied and was deleted on the spot.
    pub remaining: Option<RoomSnapshot>,
}

/// Owns every live room and tracks which player is in which room.
#[derive(Default)]
pub struct RoomRegistry {
    /// Live rooms, keyed by code. Codes are unique among live rooms.
    rooms: HashMap<RoomCode, Room>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomCode>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// Creates a room with a fresh code and the host as sole member.
    pub fn create_room(
        &mut self,
        host: Player,
    ) -> Result<RoomCode, RoomError> {
        if self.player_rooms.contains_key(&host.id) {
            return Err(RoomError::AlreadyInRoom(host.id));
        }

        let code = self.unused_code();
        let host_id = host.id.clone();
        let host_name = host.name.clone();

        self.rooms.insert(code.clone(), Room::new(code.clone(), host));
        self.player_rooms.insert(host_id, code.clone());

        tracing::info!(room_code = %code, host = %host_name, "room created");
        Ok(code)
    }

    /// Adds a player to an existing room.
    ///
    /// Returns the membership + game state as of the join, for the
    /// `room_joined` / `player_joined` responses.
    pub fn join_room(
        &mut self,
        code: &RoomCode,
        player: Player,
    ) -> Result<RoomSnapshot, RoomError> {
        if self.player_rooms.contains_key(&player.id) {
            return Err(RoomError::AlreadyInRoom(player.id));
        }

        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        if room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }

        let player_id = player.id.clone();
        let player_name = player.name.clone();
        room.insert(player);
        self.player_rooms.insert(player_id, code.clone());

        tracing::info!(
            room_code = %code,
            player = %player_name,
            players = room.player_count(),
            "player joined"
        );
        Ok(room.snapshot())
    }

    /// Removes a player from their room, deleting the room immediately
    /// if it empties.
    ///
    /// Idempotent: returns `None` when the player is in no room, so a
    /// second invocation from a racing cleanup path is a harmless no-op.
    pub fn leave_room(&mut self, player_id: &PlayerId) -> Option<Departure> {
        let room_code = self.player_rooms.remove(player_id)?;
        let room = self.rooms.get_mut(&room_code)?;
        let player = room.remove(player_id)?;

        tracing::info!(
            room_code = %room_code,
            %player_id,
            players = room.player_count(),
            "player left"
        );

        let remaining = if room.is_empty() {
            self.rooms.remove(&room_code);
            tracing::info!(room_code = %room_code, "room deleted (empty)");
            None
        } else {
            Some(room.snapshot())
        };

        Some(Departure {
            room_code,
            player,
            remaining,
        })
    }

    /// Overwrites the room's dice value and turn index.
    ///
    /// No turn-order validation: rule enforcement is a client concern.
    pub fn apply_dice_roll(
        &mut self,
        code: &RoomCode,
        dice_value: u32,
        current_player: u32,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.apply_dice_roll(dice_value, current_player);
        Ok(())
    }

    /// Overwrites the room's piece positions and turn index.
    pub fn apply_move(
        &mut self,
        code: &RoomCode,
        pieces: Vec<serde_json::Value>,
        current_player: u32,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.apply_move(pieces, current_player);
        Ok(())
    }

    /// Ids of a room's current members; empty if the room is gone.
    pub fn members(&self, code: &RoomCode) -> Vec<PlayerId> {
        self.rooms
            .get(code)
            .map(Room::member_ids)
            .unwrap_or_default()
    }

    /// Snapshot of a room's membership and game state.
    pub fn snapshot(&self, code: &RoomCode) -> Option<RoomSnapshot> {
        self.rooms.get(code).map(Room::snapshot)
    }

    /// Returns `true` if a room with this code is live.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// The room a player currently belongs to, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(player_id)
    }

    /// Rooms still waiting for players, for the `public_rooms` listing.
    pub fn public_rooms(&self) -> Vec<PublicRoomEntry> {
        self.rooms
            .values()
            .filter(|room| {
                room.status() == tablero_protocol::RoomStatus::Waiting
                    && !room.is_full()
            })
            .map(|room| PublicRoomEntry {
                room_code: room.code().clone(),
                host_name: room
                    .host()
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "Jugador".to_owned()),
                player_count: room.player_count(),
                max_players: Room::MAX_PLAYERS,
                status: room.status(),
                created_at: room.created_at_millis(),
            })
            .collect()
    }

    /// Deletes empty rooms older than `threshold`.
    ///
    /// Normal empty-room deletion happens on the last leave; this is the
    /// safety net for any path that left an empty room behind. Occupied
    /// rooms are never reaped, whatever their age.
    pub fn reap_idle(&mut self, threshold: Duration) -> Vec<RoomCode> {
        let stale: Vec<RoomCode> = self
            .rooms
            .values()
            .filter(|room| room.is_empty() && room.age() > threshold)
            .map(|room| room.code().clone())
            .collect();

        for code in &stale {
            self.rooms.remove(code);
            tracing::info!(room_code = %code, "room reaped (idle)");
        }
        stale
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Generates a code no live room is using.
    ///
    /// Collisions are unlikely (36^6 codes) but silently reusing a live
    /// code would splice two games together, so re-roll until free.
    fn unused_code(&self) -> RoomCode {
        loop {
            let code = random_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

/// One random 6-character uppercase-alphanumeric code.
fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect();
    RoomCode::new(code)
}

// =========================================================================
// Tests
// =========================================================================
