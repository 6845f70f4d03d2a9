//! UseCase layer: the broadcast core.
//!
//! - `connection_handler`: per-connection lifecycle (register, read, deregister)
//! - `relay_loop`: single consumer of the relay queue, fans each message out
//! - `hub`: supervises both
//! - `stats`: counters for observability

mod connection_handler;
mod hub;
mod relay_loop;
mod stats;

pub use connection_handler::ConnectionHandler;
pub use hub::RelayHub;
pub use relay_loop::{FanOutReport, RelayLoop, broadcast_targets};
pub use stats::{RelayStats, RelayStatsSnapshot};
