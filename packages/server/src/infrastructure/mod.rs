//! Infrastructure layer: concrete registry, relay queue, channel adapters and DTOs.

pub mod channel;
pub mod dto;
pub mod queue;
pub mod registry;
