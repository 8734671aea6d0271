//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Unique login name
    pub email: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new user row with a fresh id
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            email,
            password: password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

// =============================================================================
// Bookmark
// =============================================================================

/// A stored bookmark owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub folder: String,
    pub url: String,
    /// Epoch seconds taken from the export's ADD_DATE attribute
    pub add_date: i64,
    /// Favicon, usually a data URI
    pub icon: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Bookmark extracted from an import, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBookmark {
    pub user_id: String,
    pub folder: String,
    pub url: String,
    pub add_date: i64,
    pub icon: String,
    pub name: String,
}

impl NewBookmark {
    /// Assign an id and timestamps
    pub fn into_bookmark(self) -> Bookmark {
        let now = Utc::now();
        Bookmark {
            id: EntityId::new().0,
            user_id: self.user_id,
            folder: self.folder,
            url: self.url,
            add_date: self.add_date,
            icon: self.icon,
            name: self.name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Partial update of an existing bookmark
///
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkUpdate {
    #[serde(default, alias = "ID")]
    pub id: String,
    #[serde(default, alias = "Folder")]
    pub folder: Option<String>,
    #[serde(default, alias = "URL")]
    pub url: Option<String>,
    #[serde(default, alias = "AddDate")]
    pub add_date: Option<i64>,
    #[serde(default, alias = "Icon")]
    pub icon: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
}
