//! Utilities shared by the Hiroba packages: logger setup and time helpers.

pub mod logger;
pub mod time;
