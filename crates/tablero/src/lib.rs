//! # tablero
//!
//! Realtime session coordinator for a multiplayer turn-based board game
//! played over persistent WebSocket connections. Clients create a room,
//! join one by code, and relay dice rolls and piece moves to everyone
//! else in the same room; the server tracks connection liveness and
//! reaps abandoned rooms.
//!
//! The server validates no game rules — it is a relay of state the
//! clients agree on. What it does guarantee: room capacity, one room per
//! player, immediate teardown of emptied rooms, and that every live
//! member of a room sees each broadcast exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablero::Server;
//!
//! # async fn run() -> Result<(), tablero::ServerError> {
//! let server = Server::builder().bind("127.0.0.1:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod relay;
mod server;
mod upkeep;

pub use error::ServerError;
pub use server::{Server, ServerBuilder};
pub use upkeep::UpkeepConfig;

/// Convenience re-exports for server embedders and tests.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, ServerError, UpkeepConfig};
    pub use tablero_protocol::{
        ClientMessage, GameState, Player, PlayerId, RoomCode, RoomSnapshot,
        ServerMessage,
    };
}
