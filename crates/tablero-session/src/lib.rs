//! Connection tracking for tablero.
//!
//! This crate owns the association between a player id and its live
//! transport handle — the *connection binding*. A binding exists only
//! while the underlying connection is open; it is created when a player
//! successfully creates or joins a room and destroyed on leave or
//! disconnect.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)   ← routes messages, broadcasts through bindings
//!     ↕
//! Session layer (this crate)   ← who is connected, and where to send
//!     ↕
//! Protocol layer (below)   ← provides PlayerId, RoomCode
//! ```

mod binding;
mod registry;

pub use binding::{ConnectionBinding, OutboundSender, SendError};
pub use registry::ConnectionRegistry;
