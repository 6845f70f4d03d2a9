//! Data Transfer Objects (DTOs) for the relay.
//!
//! - `http`: HTTP API response DTOs

pub mod http;
