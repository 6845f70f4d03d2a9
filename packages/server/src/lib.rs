//! Real-time fan-out relay library.
//!
//! Every message read from one connected client is delivered to every other
//! connected client. The broadcast core (registry, relay loop, connection
//! handlers) lives in `domain` and `usecase`; `infrastructure` and `ui` adapt it
//! to axum WebSockets.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
