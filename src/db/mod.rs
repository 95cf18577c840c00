//! SQLite persistence.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The hash-chained block store that seals finished ledgers

pub mod chain;
pub mod migrations;

pub use chain::{Block, ChainError, ChainStore};
pub use migrations::init_db;
