//! The connection registry: every currently-connected player's binding.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself — it is a plain
//! `HashMap` owned by the server and accessed through a mutex at a
//! higher level. Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;

use tablero_protocol::{PlayerId, RoomCode};

use crate::{ConnectionBinding, OutboundSender};

/// Maps each connected player to their [`ConnectionBinding`].
///
/// Invariant maintained with the room registry: a binding references a
/// room that exists, and every connected member of a room has exactly
/// one binding (torn down on leave or disconnect).
#[derive(Default)]
pub struct ConnectionRegistry {
    bindings: HashMap<PlayerId, ConnectionBinding>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Records a binding for a player who just created or joined a room.
    ///
    /// Player ids are generated fresh on every create/join, so a live
    /// entry for the same id should not exist; if one does it is
    /// replaced, since the newer handle is the one that is live.
    pub fn register(
        &mut self,
        player_id: PlayerId,
        sender: OutboundSender,
        room_code: RoomCode,
    ) {
        let binding = ConnectionBinding::new(sender, room_code);
        if self.bindings.insert(player_id.clone(), binding).is_some() {
            tracing::warn!(%player_id, "replaced existing connection binding");
        } else {
            tracing::debug!(%player_id, "connection registered");
        }
    }

    /// Removes a player's binding. Idempotent: unknown ids are a no-op.
    pub fn unregister(
        &mut self,
        player_id: &PlayerId,
    ) -> Option<ConnectionBinding> {
        let removed = self.bindings.remove(player_id);
        if removed.is_some() {
            tracing::debug!(%player_id, "connection unregistered");
        }
        removed
    }

    /// Looks up a player's binding, if they are connected.
    pub fn lookup(&self, player_id: &PlayerId) -> Option<&ConnectionBinding> {
        self.bindings.get(player_id)
    }

    /// Number of active connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no player is connected.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
