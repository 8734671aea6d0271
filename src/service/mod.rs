//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, cache and import operations.

mod account;
mod bookmark;

pub use account::AccountService;
pub use bookmark::BookmarkService;
