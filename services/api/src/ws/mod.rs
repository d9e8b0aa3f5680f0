//! WebSocket Interview Sessions
//!
//! One WebSocket connection drives one interview:
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the connection lifecycle, from the `init` handshake to termination.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
