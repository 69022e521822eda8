//! Core types and shared functionality for cachet.
//!
//! This crate provides:
//! - Key-value store capability used by the cache layer, with in-memory,
//!   no-op and SQLite backends plus a namespacing decorator
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{CacheOptions, KeyValueStore, MemoryStore, Namespaced, NoopStore, SqliteStore};
