//! The room: membership plus the shared game record.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tablero_protocol::{
    GameState, Player, PlayerId, RoomCode, RoomSnapshot, RoomStatus,
};

/// A single game session.
///
/// Holds the player map and the embedded [`GameState`]. Age is tracked
/// on the monotonic clock (for reaping); the wall-clock creation stamp
/// only appears in public listings.
pub struct Room {
    code: RoomCode,
    created: Instant,
    created_at: u64,
    status: RoomStatus,
    players: HashMap<PlayerId, Player>,
    game_state: GameState,
}

impl Room {
    /// Maximum number of players a room can hold.
    pub const MAX_PLAYERS: usize = 4;

    /// Creates a room with the given code and its host as sole member.
    pub fn new(code: RoomCode, host: Player) -> Self {
        let mut players = HashMap::new();
        players.insert(host.id.clone(), host);
        Self {
            code,
            created: Instant::now(),
            created_at: unix_millis(),
            status: RoomStatus::Waiting,
            players,
            game_state: GameState::default(),
        }
    }

    /// The room's join code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Advisory lifecycle status (stored, never enforced).
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Wall-clock creation time, unix milliseconds.
    pub fn created_at_millis(&self) -> u64 {
        self.created_at
    }

    /// Time elapsed since the room was created.
    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }

    /// Number of players currently in the room.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if the room has no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns `true` if no further player can join.
    pub fn is_full(&self) -> bool {
        self.players.len() >= Self::MAX_PLAYERS
    }

    /// The host, if still present.
    pub fn host(&self) -> Option<&Player> {
        self.players.values().find(|p| p.is_host)
    }

    /// Ids of all current members.
    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    pub(crate) fn insert(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    pub(crate) fn remove(&mut self, player_id: &PlayerId) -> Option<Player> {
        self.players.remove(player_id)
    }

    /// Overwrites the dice value and turn index, trusting the caller.
    pub(crate) fn apply_dice_roll(
        &mut self,
        dice_value: u32,
        current_player: u32,
    ) {
        self.game_state.dice_value = dice_value;
        self.game_state.current_player = current_player;
    }

    /// Overwrites the piece positions and turn index, trusting the caller.
    pub(crate) fn apply_move(
        &mut self,
        pieces: Vec<serde_json::Value>,
        current_player: u32,
    ) {
        self.game_state.pieces = pieces;
        self.game_state.current_player = current_player;
    }

    /// Shifts the creation instant into the past, for reap tests.
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, age: Duration) {
        self.created = Instant::now() - age;
    }

    /// Point-in-time view of membership and game state.
    ///
    /// Players are ordered by join time so every recipient of the same
    /// broadcast sees an identical listing.
    pub fn snapshot(&self) -> RoomSnapshot {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        RoomSnapshot {
            players,
            game_state: self.game_state.clone(),
        }
    }
}

/// Milliseconds since the Unix epoch.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
