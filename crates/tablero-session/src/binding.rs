//! The connection binding: a player's outbound handle plus their room.

use tablero_protocol::RoomCode;
use tokio::sync::mpsc;

/// Channel sender that delivers encoded frames to a connection's writer
/// task. Unbounded: a push never awaits, so broadcasting to a room is
/// never stalled by one slow recipient — only that recipient's writer
/// task blocks on its own socket.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Sending failed because the connection's writer task is gone — the
/// transport is closed or closing.
#[derive(Debug, thiserror::Error)]
#[error("connection closed")]
pub struct SendError;

/// The live association between a connected player and their room.
///
/// The handle is usable only for sending; inbound messages reach the
/// router directly from the connection's receive loop.
#[derive(Debug, Clone)]
pub struct ConnectionBinding {
    sender: OutboundSender,
    room_code: RoomCode,
}

impl ConnectionBinding {
    /// Creates a binding from a writer-task sender and a room code.
    pub fn new(sender: OutboundSender, room_code: RoomCode) -> Self {
        Self { sender, room_code }
    }

    /// The room this connection's player currently belongs to.
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Queues an encoded frame for delivery. Never blocks.
    pub fn send(&self, frame: String) -> Result<(), SendError> {
        self.sender.send(frame).map_err(|_| SendError)
    }
}
