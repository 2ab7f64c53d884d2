//! Per-connection handler: receive loop and message routing.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Spawn the writer task (sole writer to this socket)
//!   2. Loop: receive frames → decode → dispatch by message type
//!   3. On close, error, or panic: run disconnect cleanup
//!
//! Routing state per connection is just the current player id and room
//! code — absent until a successful create/join, cleared on leave.

use std::sync::{Arc, Mutex as StdMutex};

use tablero_protocol::{
    ClientMessage, Codec, Player, PlayerId, ProtocolError, RoomCode,
    ServerMessage,
};
use tablero_room::RoomError;
use tablero_session::OutboundSender;
use tablero_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::relay;
use crate::server::ServerState;
use crate::ServerError;

const POISONED: &str = "connection state lock poisoned";

/// Routing state for one connection.
#[derive(Default)]
struct ConnState {
    player_id: Option<PlayerId>,
    room_code: Option<RoomCode>,
}

/// Shared with the [`CleanupGuard`] so cleanup can find the current
/// identity even if the handler unwinds mid-message.
type SharedConnState = Arc<StdMutex<ConnState>>;

/// Drop guard that tears down the connection's player when the handler
/// exits. This ensures cleanup happens even if the handler panics.
/// Since `Drop` is synchronous, it spawns a fire-and-forget task for
/// the async work; the normal exit path runs cleanup inline first and
/// empties the slot, making the guard a no-op.
struct CleanupGuard {
    state: Arc<ServerState>,
    conn_state: SharedConnState,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let player_id = self
            .conn_state
            .lock()
            .ok()
            .and_then(|mut cs| cs.player_id.take());
        if let Some(pid) = player_id {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                relay::disconnect_cleanup(&state, &pid).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);

    // Writer task: the only place this connection's socket is written.
    // Everyone else (router replies, room broadcasts) pushes onto the
    // channel, which never blocks — a stalled peer stalls only its own
    // writer.
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = conn.send(&frame).await {
                    tracing::debug!(error = %e, "outbound send failed");
                    break;
                }
            }
        })
    };

    let conn_state: SharedConnState = Arc::default();
    let _guard = CleanupGuard {
        state: Arc::clone(&state),
        conn_state: Arc::clone(&conn_state),
    };

    loop {
        let text = match conn.recv().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let message = match state.codec.decode_inbound(&text) {
            Ok(message) => message,
            Err(ProtocolError::UnknownType(tag)) => {
                tracing::debug!(%conn_id, %tag, "ignoring unknown message type");
                continue;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring malformed message");
                continue;
            }
        };

        // A fault while handling one message must never end the loop;
        // the connection keeps processing subsequent messages.
        if let Err(e) =
            route_message(&state, &conn_state, &outbound, message).await
        {
            tracing::warn!(%conn_id, error = %e, "message handling failed");
        }
    }

    // Normal teardown. Taking the id out here keeps the guard from
    // spawning a second (harmless but wasteful) cleanup.
    let player_id = conn_state
        .lock()
        .ok()
        .and_then(|mut cs| cs.player_id.take());
    if let Some(pid) = player_id {
        relay::disconnect_cleanup(&state, &pid).await;
    }

    // Closing the channel lets the writer drain queued frames and exit.
    drop(outbound);
    let _ = writer.await;
    let _ = conn.close().await;
    tracing::debug!(%conn_id, "connection handler finished");
}

/// Dispatches one decoded message to its handler.
async fn route_message(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
    outbound: &OutboundSender,
    message: ClientMessage,
) -> Result<(), ServerError> {
    match message {
        ClientMessage::CreateRoom {
            player_name,
            player_color,
        } => {
            handle_create_room(
                state,
                conn_state,
                outbound,
                player_name,
                player_color,
            )
            .await
        }
        ClientMessage::JoinRoom {
            room_code,
            player_name,
            player_color,
        } => {
            handle_join_room(
                state,
                conn_state,
                outbound,
                room_code,
                player_name,
                player_color,
            )
            .await
        }
        ClientMessage::LeaveRoom => {
            handle_leave_room(state, conn_state).await;
            Ok(())
        }
        ClientMessage::DiceRoll {
            dice_value,
            current_player,
        } => {
            handle_dice_roll(state, conn_state, dice_value, current_player)
                .await;
            Ok(())
        }
        ClientMessage::GameMove {
            pieces,
            current_player,
        } => {
            handle_game_move(state, conn_state, pieces, current_player)
                .await;
            Ok(())
        }
        ClientMessage::GetPublicRooms => {
            let rooms = state.rooms.lock().await.public_rooms();
            send_direct(state, outbound, &ServerMessage::PublicRooms { rooms })
        }
    }
}

async fn handle_create_room(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
    outbound: &OutboundSender,
    player_name: String,
    player_color: String,
) -> Result<(), ServerError> {
    // A connection that already holds an identity abandons it first, so
    // the one-room-per-player invariant can't be wedged from one socket.
    release_current(state, conn_state).await;

    let player = Player::new(player_name, player_color, true);
    let room_code = state
        .rooms
        .lock()
        .await
        .create_room(player.clone())?;

    state.connections.lock().await.register(
        player.id.clone(),
        outbound.clone(),
        room_code.clone(),
    );

    {
        let mut cs = conn_state.lock().expect(POISONED);
        cs.player_id = Some(player.id.clone());
        cs.room_code = Some(room_code.clone());
    }

    send_direct(
        state,
        outbound,
        &ServerMessage::RoomCreated {
            room_code,
            player_id: player.id.clone(),
            player_data: player,
        },
    )
}

async fn handle_join_room(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
    outbound: &OutboundSender,
    room_code: RoomCode,
    player_name: String,
    player_color: String,
) -> Result<(), ServerError> {
    let player = Player::new(player_name, player_color, false);

    // Membership and the snapshot for the outgoing messages come from
    // the same lock scope, so every recipient sees the post-join state.
    let joined = state
        .rooms
        .lock()
        .await
        .join_room(&room_code, player.clone());

    let snapshot = match joined {
        Ok(snapshot) => snapshot,
        Err(e @ (RoomError::NotFound(_) | RoomError::RoomFull(_))) => {
            tracing::debug!(room_code = %room_code, error = %e, "join rejected");
            // A rejected join leaves any current membership untouched.
            return send_direct(
                state,
                outbound,
                &ServerMessage::Error {
                    message: e.to_string(),
                },
            );
        }
        Err(e) => return Err(e.into()),
    };

    // Only now abandon the connection's previous identity, if any.
    release_current(state, conn_state).await;

    state.connections.lock().await.register(
        player.id.clone(),
        outbound.clone(),
        room_code.clone(),
    );

    {
        let mut cs = conn_state.lock().expect(POISONED);
        cs.player_id = Some(player.id.clone());
        cs.room_code = Some(room_code.clone());
    }

    send_direct(
        state,
        outbound,
        &ServerMessage::RoomJoined {
            room_code: room_code.clone(),
            player_id: player.id.clone(),
            player_data: player.clone(),
            room_data: snapshot.clone(),
        },
    )?;

    relay::broadcast(
        state,
        &room_code,
        &ServerMessage::PlayerJoined {
            player_data: player.clone(),
            room_data: snapshot,
        },
        Some(&player.id),
    )
    .await;

    Ok(())
}

async fn handle_leave_room(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
) {
    // No response to the sender; the remaining members hear about it
    // through the cleanup's player_left broadcast.
    release_current(state, conn_state).await;
}

async fn handle_dice_roll(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
    dice_value: u32,
    current_player: u32,
) {
    let Some((player_id, room_code)) = current_identity(conn_state) else {
        tracing::debug!("dice roll from a connection with no room");
        return;
    };

    let applied = state.rooms.lock().await.apply_dice_roll(
        &room_code,
        dice_value,
        current_player,
    );
    if let Err(e) = applied {
        tracing::debug!(room_code = %room_code, error = %e, "dice roll dropped");
        return;
    }

    relay::broadcast(
        state,
        &room_code,
        &ServerMessage::DiceRolled {
            dice_value,
            current_player,
            player_id,
        },
        None,
    )
    .await;
}

async fn handle_game_move(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
    pieces: Vec<serde_json::Value>,
    current_player: u32,
) {
    let Some((player_id, room_code)) = current_identity(conn_state) else {
        tracing::debug!("game move from a connection with no room");
        return;
    };

    let applied = state.rooms.lock().await.apply_move(
        &room_code,
        pieces.clone(),
        current_player,
    );
    if let Err(e) = applied {
        tracing::debug!(room_code = %room_code, error = %e, "game move dropped");
        return;
    }

    relay::broadcast(
        state,
        &room_code,
        &ServerMessage::GameMove {
            pieces,
            current_player,
            player_id,
        },
        None,
    )
    .await;
}

/// Clears this connection's identity, running disconnect cleanup for it.
async fn release_current(
    state: &Arc<ServerState>,
    conn_state: &SharedConnState,
) {
    let previous = {
        let mut cs = conn_state.lock().expect(POISONED);
        cs.room_code = None;
        cs.player_id.take()
    };
    if let Some(pid) = previous {
        relay::disconnect_cleanup(state, &pid).await;
    }
}

/// The connection's current player and room, if it has joined one.
fn current_identity(
    conn_state: &SharedConnState,
) -> Option<(PlayerId, RoomCode)> {
    let cs = conn_state.lock().expect(POISONED);
    Some((cs.player_id.clone()?, cs.room_code.clone()?))
}

/// Queues a reply to this connection's own writer.
///
/// A failed push means the writer is gone and the connection is already
/// tearing down; the close path handles the rest.
fn send_direct(
    state: &ServerState,
    outbound: &OutboundSender,
    message: &ServerMessage,
) -> Result<(), ServerError> {
    let frame = state.codec.encode(message)?;
    if outbound.send(frame).is_err() {
        tracing::debug!("reply dropped, connection closing");
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
