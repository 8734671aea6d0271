//! SQLite database operations
//!
//! All database access goes through this module.
//! Reads never return soft-deleted rows.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;
use crate::metrics::DB_QUERIES_TOTAL;

fn record_query(operation: &str, table: &str) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
}

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Look up a live user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        record_query("select", "users");
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ? AND deleted_at IS NULL LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look up a live user by id
    #[cfg(test)]
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        record_query("select", "users");
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    /// Insert a new user
    ///
    /// # Errors
    /// `AppError::Conflict` when the email is already registered
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        record_query("insert", "users");
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                Err(AppError::Conflict("User already exists".to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Count live users
    pub async fn count_users(&self) -> Result<i64, AppError> {
        record_query("count", "users");
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// All live bookmarks of one user, in insertion order
    pub async fn get_user_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, AppError> {
        record_query("select", "bookmarks");
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            "SELECT * FROM bookmarks WHERE user_id = ? AND deleted_at IS NULL ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookmarks)
    }

    /// A single live bookmark, scoped to its owner
    #[cfg(test)]
    pub async fn get_bookmark(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Bookmark>, AppError> {
        record_query("select", "bookmarks");
        let bookmark = sqlx::query_as::<_, Bookmark>(
            "SELECT * FROM bookmarks WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bookmark)
    }

    /// Insert a batch of bookmarks atomically
    ///
    /// # Returns
    /// Number of rows inserted
    pub async fn insert_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<u64, AppError> {
        if bookmarks.is_empty() {
            return Ok(0);
        }

        record_query("insert", "bookmarks");
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for bookmark in bookmarks {
            let result = sqlx::query(
                r#"
                INSERT INTO bookmarks
                    (id, user_id, folder, url, add_date, icon, name, created_at, updated_at, deleted_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&bookmark.id)
            .bind(&bookmark.user_id)
            .bind(&bookmark.folder)
            .bind(&bookmark.url)
            .bind(bookmark.add_date)
            .bind(&bookmark.icon)
            .bind(&bookmark.name)
            .bind(bookmark.created_at)
            .bind(bookmark.updated_at)
            .bind(bookmark.deleted_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Apply a partial update to a bookmark owned by `user_id`
    ///
    /// # Returns
    /// `false` if no live bookmark with that id belongs to the user
    pub async fn update_bookmark(
        &self,
        user_id: &str,
        update: &BookmarkUpdate,
    ) -> Result<bool, AppError> {
        record_query("update", "bookmarks");
        let result = sqlx::query(
            r#"
            UPDATE bookmarks SET
                folder = COALESCE(?, folder),
                url = COALESCE(?, url),
                add_date = COALESCE(?, add_date),
                icon = COALESCE(?, icon),
                name = COALESCE(?, name),
                updated_at = ?
            WHERE id = ? AND user_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(update.folder.as_deref())
        .bind(update.url.as_deref())
        .bind(update.add_date)
        .bind(update.icon.as_deref())
        .bind(update.name.as_deref())
        .bind(Utc::now())
        .bind(&update.id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a bookmark owned by `user_id` as deleted
    ///
    /// # Returns
    /// `false` if no live bookmark with that id belongs to the user
    pub async fn soft_delete_bookmark(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        record_query("delete", "bookmarks");
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookmarks SET deleted_at = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
