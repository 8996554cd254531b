//! Core types and shared functionality for sharecache.
//!
//! This crate provides:
//! - Generation-scoped snapshot store with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, MemoryStore, RequestKey, ResponseSnapshot, SnapshotStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
