//! Wire protocol for tablero.
//!
//! This crate defines the vocabulary that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Player`],
//!   [`GameState`], the identity newtypes) — the structures that travel
//!   on the wire as JSON text.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding,
//!   split by how the server must react (ignore silently vs. log).
//!
//! The protocol layer sits between transport (text frames) and the
//! registries (rooms, connections). It knows nothing about who is
//! connected or which rooms exist.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameState, Player, PlayerId, PublicRoomEntry, RoomCode,
    RoomSnapshot, RoomStatus, ServerMessage,
};
