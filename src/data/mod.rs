//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Bookmark listing cache (volatile)

mod cache;
mod database;
mod models;

pub use cache::BookmarkCache;
pub use database::Database;
pub use models::*;
