//! Core protocol types for tablero's wire format.
//!
//! Every type here travels on the wire as part of a JSON text frame.
//! Inbound and outbound messages are closed tagged enums, one variant
//! per `type` value, so required fields are validated at decode time
//! instead of being fished out of an untyped map in each handler.
//!
//! Field names on the wire are camelCase (`playerName`, `roomCode`,
//! `diceValue`); tag values are snake_case (`create_room`). Both are
//! fixed by the client protocol and locked down by the tests below.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Generated server-side as `player_<unix-millis>_<random suffix>`:
/// unique per process lifetime, which is all the registries require.
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh player id.
    pub fn generate() -> Self {
        const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        const SUFFIX_LEN: usize = 9;

        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                SUFFIX_CHARS[rng.random_range(0..SUFFIX_CHARS.len())] as char
            })
            .collect();
        Self(format!("player_{}_{suffix}", unix_millis()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room's join code: six uppercase alphanumeric characters.
///
/// Construction of *random* codes lives in the room registry, which is
/// the only place that can check them against live rooms for collisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps an existing code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Shared game data
// ---------------------------------------------------------------------------

/// A participant in a room.
///
/// Created once on create/join and never mutated afterwards; a player
/// leaves by being removed from the room's membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub is_host: bool,
    /// Unix timestamp in milliseconds.
    pub joined_at: u64,
}

impl Player {
    /// Creates a player with a fresh id, stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        is_host: bool,
    ) -> Self {
        Self {
            id: PlayerId::generate(),
            name: name.into(),
            color: color.into(),
            is_host,
            joined_at: unix_millis(),
        }
    }
}

/// The room-scoped mutable game record, trusted as reported by clients.
///
/// The server applies dice rolls and moves unconditionally; rule
/// enforcement is a client concern, and the server is a relay of
/// agreed-upon state. `pieces` in particular is an ordered sequence of
/// piece-position records that the server never inspects, hence
/// `serde_json::Value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_player: u32,
    pub dice_value: u32,
    pub pieces: Vec<serde_json::Value>,
    pub game_started: bool,
    pub game_ended: bool,
}

/// Advisory lifecycle status of a room. Stored and reported, never
/// enforced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Point-in-time view of a room sent inside `room_joined`,
/// `player_joined`, and `player_left` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub players: Vec<Player>,
    pub game_state: GameState,
}

/// A summary of a joinable room returned in `public_rooms` listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRoomEntry {
    pub room_code: RoomCode,
    pub host_name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
    /// Unix timestamp in milliseconds.
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

fn default_player_name() -> String {
    "Jugador".to_owned()
}

fn default_host_color() -> String {
    "red".to_owned()
}

fn default_guest_color() -> String {
    "blue".to_owned()
}

/// Messages a client can send, one variant per wire `type` value.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "create_room", "playerName": "Ann", ... }`.
/// Optional fields fall back to the defaults the clients rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        #[serde(default = "default_player_name")]
        player_name: String,
        #[serde(default = "default_host_color")]
        player_color: String,
    },

    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_code: RoomCode,
        #[serde(default = "default_player_name")]
        player_name: String,
        #[serde(default = "default_guest_color")]
        player_color: String,
    },

    LeaveRoom,

    #[serde(rename_all = "camelCase")]
    DiceRoll {
        dice_value: u32,
        current_player: u32,
    },

    #[serde(rename_all = "camelCase")]
    GameMove {
        pieces: Vec<serde_json::Value>,
        current_player: u32,
    },

    GetPublicRooms,
}

impl ClientMessage {
    /// Every wire `type` value this enum can decode. Used by the codec
    /// to tell an unknown type apart from a malformed body.
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "create_room",
        "join_room",
        "leave_room",
        "dice_roll",
        "game_move",
        "get_public_rooms",
    ];
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server sends, one variant per wire `type` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// To the creator only: the room exists and they are its host.
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
        player_data: Player,
    },

    /// To the joiner only: membership and game state as of the join.
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
        player_data: Player,
        room_data: RoomSnapshot,
    },

    /// To the rest of the room when someone joins.
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player_data: Player,
        room_data: RoomSnapshot,
    },

    /// To the remaining members when someone leaves or disconnects.
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: PlayerId,
        room_data: RoomSnapshot,
    },

    /// To the whole room, sender included.
    #[serde(rename_all = "camelCase")]
    DiceRolled {
        dice_value: u32,
        current_player: u32,
        player_id: PlayerId,
    },

    /// To the whole room, sender included.
    #[serde(rename_all = "camelCase")]
    GameMove {
        pieces: Vec<serde_json::Value>,
        current_player: u32,
        player_id: PlayerId,
    },

    /// To the requester only: rooms currently waiting for players.
    PublicRooms { rooms: Vec<PublicRoomEntry> },

    /// To the sender only, for room-lookup failures.
    Error { message: String },
}

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is fixed by the deployed clients. These tests
    //! pin the exact JSON shapes: a mismatch here means a client that
    //! can't parse the server, not a cosmetic difference.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_generate_has_expected_shape() {
        let id = PlayerId::generate();
        let s = id.as_str();
        assert!(s.starts_with("player_"), "got {s}");

        let parts: Vec<&str> = s.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_player_id_generate_is_unique() {
        let a = PlayerId::generate();
        let b = PlayerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let id = PlayerId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let code = RoomCode::new("AB12CD");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"AB12CD\"");
        assert_eq!(code.to_string(), "AB12CD");
    }

    // =====================================================================
    // Shared data shapes
    // =====================================================================

    #[test]
    fn test_player_json_field_names() {
        let player = Player::new("Ann", "red", true);
        let json: serde_json::Value = serde_json::to_value(&player).unwrap();

        assert_eq!(json["name"], "Ann");
        assert_eq!(json["color"], "red");
        assert_eq!(json["isHost"], true);
        assert!(json["joinedAt"].is_u64());
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_game_state_default_json_shape() {
        let json: serde_json::Value =
            serde_json::to_value(GameState::default()).unwrap();

        assert_eq!(json["currentPlayer"], 0);
        assert_eq!(json["diceValue"], 0);
        assert_eq!(json["pieces"], serde_json::json!([]));
        assert_eq!(json["gameStarted"], false);
        assert_eq!(json["gameEnded"], false);
    }

    #[test]
    fn test_room_status_serializes_lowercase() {
        let json = serde_json::to_string(&RoomStatus::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
        assert_eq!(RoomStatus::default(), RoomStatus::Waiting);
    }

    #[test]
    fn test_public_room_entry_json_field_names() {
        let entry = PublicRoomEntry {
            room_code: RoomCode::new("XYZ789"),
            host_name: "Ann".into(),
            player_count: 2,
            max_players: 4,
            status: RoomStatus::Waiting,
            created_at: 1_700_000_000_000,
        };
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["roomCode"], "XYZ789");
        assert_eq!(json["hostName"], "Ann");
        assert_eq!(json["playerCount"], 2);
        assert_eq!(json["maxPlayers"], 4);
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["createdAt"], 1_700_000_000_000u64);
    }

    // =====================================================================
    // ClientMessage — decode shapes and defaults
    // =====================================================================

    #[test]
    fn test_create_room_decodes_with_all_fields() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"create_room","playerName":"Ann","playerColor":"green"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                player_name: "Ann".into(),
                player_color: "green".into(),
            }
        );
    }

    #[test]
    fn test_create_room_applies_defaults() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"create_room"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                player_name: "Jugador".into(),
                player_color: "red".into(),
            }
        );
    }

    #[test]
    fn test_join_room_applies_defaults_but_requires_code() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"join_room","roomCode":"AB12CD"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_code: RoomCode::new("AB12CD"),
                player_name: "Jugador".into(),
                player_color: "blue".into(),
            }
        );

        // Without the code the message is malformed.
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"join_room"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_leave_room_is_bare() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"leave_room"}"#).unwrap();
        assert_eq!(msg, ClientMessage::LeaveRoom);
    }

    #[test]
    fn test_dice_roll_requires_both_fields() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"dice_roll","diceValue":4,"currentPlayer":1}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::DiceRoll {
                dice_value: 4,
                current_player: 1,
            }
        );

        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"dice_roll","diceValue":4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_game_move_carries_opaque_pieces() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"game_move","pieces":[{"id":0,"cell":17}],"currentPlayer":2}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::GameMove {
                pieces,
                current_player,
            } => {
                assert_eq!(pieces.len(), 1);
                assert_eq!(pieces[0]["cell"], 17);
                assert_eq!(current_player, 2);
            }
            other => panic!("expected GameMove, got {other:?}"),
        }
    }

    #[test]
    fn test_known_types_matches_every_variant() {
        // Each listed tag must decode to *some* variant when given the
        // fields it needs; this keeps KNOWN_TYPES honest.
        for (tag, body) in [
            ("create_room", r#"{"type":"create_room"}"#),
            ("join_room", r#"{"type":"join_room","roomCode":"A1B2C3"}"#),
            ("leave_room", r#"{"type":"leave_room"}"#),
            (
                "dice_roll",
                r#"{"type":"dice_roll","diceValue":1,"currentPlayer":0}"#,
            ),
            (
                "game_move",
                r#"{"type":"game_move","pieces":[],"currentPlayer":0}"#,
            ),
            ("get_public_rooms", r#"{"type":"get_public_rooms"}"#),
        ] {
            assert!(ClientMessage::KNOWN_TYPES.contains(&tag));
            let decoded: Result<ClientMessage, _> = serde_json::from_str(body);
            assert!(decoded.is_ok(), "tag {tag} should decode");
        }
        assert_eq!(ClientMessage::KNOWN_TYPES.len(), 6);
    }

    // =====================================================================
    // ServerMessage — encode shapes
    // =====================================================================

    #[test]
    fn test_room_created_json_shape() {
        let player = Player::new("Ann", "red", true);
        let msg = ServerMessage::RoomCreated {
            room_code: RoomCode::new("AB12CD"),
            player_id: player.id.clone(),
            player_data: player.clone(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "room_created");
        assert_eq!(json["roomCode"], "AB12CD");
        assert_eq!(json["playerId"], player.id.as_str());
        assert_eq!(json["playerData"]["isHost"], true);
    }

    #[test]
    fn test_room_joined_json_shape() {
        let host = Player::new("Ann", "red", true);
        let guest = Player::new("Bo", "blue", false);
        let msg = ServerMessage::RoomJoined {
            room_code: RoomCode::new("AB12CD"),
            player_id: guest.id.clone(),
            player_data: guest.clone(),
            room_data: RoomSnapshot {
                players: vec![host, guest],
                game_state: GameState::default(),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "room_joined");
        assert_eq!(json["roomData"]["players"].as_array().unwrap().len(), 2);
        assert_eq!(json["roomData"]["gameState"]["diceValue"], 0);
    }

    #[test]
    fn test_player_left_json_shape() {
        let host = Player::new("Ann", "red", true);
        let msg = ServerMessage::PlayerLeft {
            player_id: PlayerId::generate(),
            room_data: RoomSnapshot {
                players: vec![host],
                game_state: GameState::default(),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "player_left");
        assert!(json["playerId"].is_string());
        assert_eq!(json["roomData"]["players"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_dice_rolled_json_shape() {
        let msg = ServerMessage::DiceRolled {
            dice_value: 4,
            current_player: 1,
            player_id: PlayerId::generate(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "dice_rolled");
        assert_eq!(json["diceValue"], 4);
        assert_eq!(json["currentPlayer"], 1);
    }

    #[test]
    fn test_error_json_shape() {
        let msg = ServerMessage::Error {
            message: "room AB12CD not found".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "room AB12CD not found");
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = ServerMessage::GameMove {
            pieces: vec![serde_json::json!({"id": 3, "cell": 42})],
            current_player: 3,
            player_id: PlayerId::generate(),
        };
        let text = serde_json::to_string(&msg).unwrap();
        let decoded: ServerMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg, decoded);
    }
}
