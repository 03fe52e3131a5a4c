//! Wicket core traits and utilities

pub mod storage;

pub use storage::{MemoryTokenStore, TokenStore};
