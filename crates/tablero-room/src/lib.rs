//! Room lifecycle management for tablero.
//!
//! A room is a game session identified by a six-character join code,
//! holding up to four players and the shared [`GameState`] they report.
//! The [`RoomRegistry`] owns every live room and enforces the structural
//! invariants: unique codes, capacity, one room per player, and
//! immediate deletion of emptied rooms (with periodic reaping as a
//! safety net).
//!
//! No game rules live here — dice values and piece positions are applied
//! exactly as the clients report them.
//!
//! [`GameState`]: tablero_protocol::GameState

mod error;
mod model;
mod registry;

pub use error::RoomError;
pub use model::Room;
pub use registry::{Departure, RoomRegistry};
