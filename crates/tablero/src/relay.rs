//! Message relay: room broadcasts and disconnect cleanup.
//!
//! The two are intertwined: a broadcast that discovers a dead recipient
//! starts that recipient's cleanup, and cleanup broadcasts `player_left`
//! to the survivors, which can in turn discover further dead recipients.
//! The cascade is processed with a worklist, not recursion.

use tablero_protocol::{Codec, PlayerId, RoomCode, ServerMessage};

use crate::server::ServerState;

/// Sends an already-encoded frame to every member of a room except
/// `exclude`, returning the ids whose connection turned out to be dead.
///
/// Membership is snapshotted once at call time: players who join or
/// leave while frames are being queued are not racily included or
/// excluded. Each send is a non-blocking channel push, so one slow
/// recipient never stalls the rest of the room or the server.
async fn send_to_members(
    state: &ServerState,
    room_code: &RoomCode,
    frame: &str,
    exclude: Option<&PlayerId>,
) -> Vec<PlayerId> {
    let members = state.rooms.lock().await.members(room_code);

    let connections = state.connections.lock().await;
    let mut failed = Vec::new();
    for member in members {
        if Some(&member) == exclude {
            continue;
        }
        // A member without a binding has nothing to deliver to; their
        // own cleanup path is already tearing them down.
        if let Some(binding) = connections.lookup(&member) {
            if binding.send(frame.to_owned()).is_err() {
                tracing::debug!(
                    player_id = %member,
                    room_code = %room_code,
                    "send failed, connection presumed dead"
                );
                failed.push(member);
            }
        }
    }
    failed
}

/// Broadcasts a message to a room, excluding at most one player.
///
/// The message is encoded once, so every recipient sees the identical
/// body; game state is captured by the caller at mutation time, never
/// re-read per recipient. Dead recipients found along the way go
/// through [`disconnect_cleanup`] without aborting delivery to the
/// rest.
pub(crate) async fn broadcast(
    state: &ServerState,
    room_code: &RoomCode,
    message: &ServerMessage,
    exclude: Option<&PlayerId>,
) {
    let frame = match state.codec.encode(message) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode broadcast");
            return;
        }
    };

    let failed = send_to_members(state, room_code, &frame, exclude).await;
    for player_id in failed {
        disconnect_cleanup(state, &player_id).await;
    }
}

/// Tears down a player's presence: room membership, `player_left`
/// notification, and connection binding, in that order.
///
/// Shared by explicit `leave_room`, transport closure, and send
/// failure, and safe to invoke from several of those paths for the
/// same player: the binding check and the membership removal are both
/// no-ops the second time, so exactly one `player_left` goes out.
pub(crate) async fn disconnect_cleanup(
    state: &ServerState,
    player_id: &PlayerId,
) {
    let mut queue = vec![player_id.clone()];

    while let Some(pid) = queue.pop() {
        if state.connections.lock().await.lookup(&pid).is_none() {
            continue;
        }

        // Membership removal is the authoritative gate: a concurrent
        // cleanup that got here first already broadcast the departure.
        let departure = state.rooms.lock().await.leave_room(&pid);

        if let Some(departure) = departure {
            tracing::info!(
                player_id = %pid,
                room_code = %departure.room_code,
                "cleaning up disconnected player"
            );

            if let Some(remaining) = departure.remaining {
                let message = ServerMessage::PlayerLeft {
                    player_id: pid.clone(),
                    room_data: remaining,
                };
                match state.codec.encode(&message) {
                    Ok(frame) => {
                        // Survivors whose connections are also dead join
                        // the worklist instead of recursing.
                        let failed = send_to_members(
                            state,
                            &departure.room_code,
                            &frame,
                            None,
                        )
                        .await;
                        queue.extend(failed);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "failed to encode player_left"
                        );
                    }
                }
            }
        }

        state.connections.lock().await.unregister(&pid);
    }
}

// =========================================================================
// Tests
// =========================================================================
