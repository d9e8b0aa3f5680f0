//! Interview API Library Crate
//!
//! This library contains the web service around the interview orchestrator:
//! configuration, application state, the result store, REST handlers,
//! WebSocket sessions and routing. The `api` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod results;
pub mod router;
pub mod state;
pub mod ws;
