//! Error types for the room layer.

use tablero_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// `NotFound` and `RoomFull` are reported back to the requesting client;
/// the rest only ever surface in logs.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room already holds the maximum number of players.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The player already belongs to a room.
    #[error("player {0} is already in a room")]
    AlreadyInRoom(PlayerId),
}
