//! ConnectionRegistry の実装
//!
//! - `inmemory`: mutex-guarded `HashMap` implementation

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
