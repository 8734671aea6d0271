//! Bookmark service
//!
//! Listing, import, update and deletion of a user's bookmarks.
//! Every mutation drops the owner's cached listing.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::data::{Bookmark, BookmarkCache, BookmarkUpdate, Database, NewBookmark};
use crate::error::AppError;
use crate::import::{read_bookmark_file, unique_by_url};
use crate::metrics::{BOOKMARK_IMPORTS_TOTAL, BOOKMARKS_IMPORTED_TOTAL};

/// Random characters in a spool file name
const SPOOL_NAME_LENGTH: usize = 10;

/// Bookmark service
pub struct BookmarkService {
    db: Arc<Database>,
    cache: Arc<BookmarkCache>,
    upload: UploadConfig,
}

impl BookmarkService {
    /// Create new bookmark service
    pub fn new(db: Arc<Database>, cache: Arc<BookmarkCache>, upload: UploadConfig) -> Self {
        Self { db, cache, upload }
    }

    /// Live bookmarks of a user, in insertion order
    pub async fn list(&self, user_id: &str) -> Result<Arc<Vec<Bookmark>>, AppError> {
        if let Some(cached) = self.cache.get(user_id).await {
            return Ok(cached);
        }

        let generation = self.cache.generation(user_id).await;
        let bookmarks = self.db.get_user_bookmarks(user_id).await?;
        Ok(self.cache.insert(user_id, bookmarks, generation).await)
    }

    /// Import a browser bookmark export for `user_id`
    ///
    /// The upload is spooled to `upload.temp_dir`, parsed, deduplicated by
    /// URL and stored in one transaction. A file without usable anchors
    /// stores nothing and still succeeds.
    ///
    /// # Returns
    /// Number of bookmarks stored
    ///
    /// # Errors
    /// - `Validation` if the upload exceeds `upload.max_bytes`
    /// - `Parse` if the spooled file cannot be read back
    pub async fn import(&self, user_id: &str, contents: Vec<u8>) -> Result<u64, AppError> {
        if contents.len() > self.upload.max_bytes {
            return Err(AppError::Validation(format!(
                "File too large: exceeds {} bytes",
                self.upload.max_bytes
            )));
        }

        let temp_dir = self.upload.temp_dir.clone();
        let owner_id = user_id.to_string();
        let parsed =
            tokio::task::spawn_blocking(move || spool_and_parse(&temp_dir, &contents, &owner_id))
                .await
                .map_err(|e| AppError::Internal(e.into()))?
                .inspect_err(|_| {
                    BOOKMARK_IMPORTS_TOTAL.with_label_values(&["failed"]).inc();
                })?;

        let parsed_count = parsed.len();
        let bookmarks: Vec<Bookmark> = unique_by_url(parsed)
            .into_iter()
            .map(NewBookmark::into_bookmark)
            .collect();

        if bookmarks.is_empty() {
            BOOKMARK_IMPORTS_TOTAL.with_label_values(&["empty"]).inc();
            tracing::info!(user_id, "Bookmark file contained nothing to import");
            return Ok(0);
        }

        let inserted = self.db.insert_bookmarks(&bookmarks).await?;
        self.cache.invalidate(user_id).await;

        BOOKMARK_IMPORTS_TOTAL.with_label_values(&["success"]).inc();
        BOOKMARKS_IMPORTED_TOTAL.inc_by(inserted);
        tracing::info!(
            user_id,
            parsed = parsed_count,
            inserted,
            "Bookmarks imported"
        );

        Ok(inserted)
    }

    /// Apply a partial update to one of the user's bookmarks
    ///
    /// # Errors
    /// - `Validation` if no id is given
    /// - `NotFound` if the user has no live bookmark with that id
    pub async fn save(&self, user_id: &str, update: BookmarkUpdate) -> Result<(), AppError> {
        if update.id.trim().is_empty() {
            return Err(AppError::Validation("bookmark id is required".to_string()));
        }

        if !self.db.update_bookmark(user_id, &update).await? {
            return Err(AppError::NotFound);
        }

        self.cache.invalidate(user_id).await;
        tracing::debug!(user_id, bookmark_id = %update.id, "Bookmark updated");
        Ok(())
    }

    /// Soft-delete one of the user's bookmarks
    ///
    /// # Errors
    /// `NotFound` if the user has no live bookmark with that id
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        if !self.db.soft_delete_bookmark(user_id, id).await? {
            return Err(AppError::NotFound);
        }

        self.cache.invalidate(user_id).await;
        tracing::debug!(user_id, bookmark_id = id, "Bookmark deleted");
        Ok(())
    }
}

/// Write the upload to a uniquely named file, then parse it back from disk
///
/// The spool file is removed when it goes out of scope, on success and on
/// error alike.
fn spool_and_parse(
    temp_dir: &Path,
    contents: &[u8],
    owner_id: &str,
) -> Result<Vec<NewBookmark>, AppError> {
    std::fs::create_dir_all(temp_dir).map_err(|e| AppError::Internal(e.into()))?;

    let mut spool = tempfile::Builder::new()
        .prefix("bookmarks-")
        .suffix(".html")
        .rand_bytes(SPOOL_NAME_LENGTH)
        .tempfile_in(temp_dir)
        .map_err(|e| AppError::Internal(e.into()))?;
    spool
        .write_all(contents)
        .and_then(|()| spool.flush())
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(read_bookmark_file(spool.path(), owner_id)?)
}
