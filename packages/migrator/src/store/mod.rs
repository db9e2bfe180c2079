//! Write side of the migration: the target forum's store.
//!
//! Three contracts keep the target forum software out of the engine:
//! [`TargetStore`] for entity rows, [`AssetStore`] for binary files, and
//! [`UploadRegistry`] for the optional attachment subsystem. Postgres and
//! local-disk implementations live in the submodules.

mod assets;
mod entities;
mod postgres;

pub use assets::DirAssets;
pub use entities::{
    DiscussionStats, NewDiscussion, NewGroup, NewPost, NewTag, NewUpload, NewUser, Post, Tag,
};
pub use postgres::{PgStore, PgUploads};

use crate::error::{AssetError, StoreError};
use async_trait::async_trait;
use std::path::Path;

/// Entity persistence in the target forum schema.
///
/// Row-level failures come back as non-fatal [`StoreError::Row`]; callers
/// skip the row and keep the phase going. [`StoreError::Connection`] aborts
/// the phase.
#[async_trait]
pub trait TargetStore: Send + Sync {
    // Groups

    /// Clear non-reserved groups before re-insertion.
    async fn delete_groups_above(&self, id: i64) -> Result<(), StoreError>;

    async fn create_group(&self, group: NewGroup) -> Result<(), StoreError>;

    // Users

    /// Clear non-reserved users (and their group links) before re-insertion.
    async fn delete_users_above(&self, id: i64) -> Result<(), StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<(), StoreError>;

    async fn add_user_to_group(&self, user_id: i64, group_id: i64) -> Result<(), StoreError>;

    // Tags

    async fn delete_all_tags(&self) -> Result<(), StoreError>;

    async fn create_tag(&self, tag: NewTag) -> Result<(), StoreError>;

    /// Fetch a tag by id. Absent tags are `Ok(None)`; parent-chain walks
    /// treat that as having reached a root.
    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError>;

    async fn count_tags(&self) -> Result<i64, StoreError>;

    /// How many existing tag slugs start with `prefix` (collision suffixing).
    async fn count_tag_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError>;

    // Discussions

    /// Clear all discussions, their posts and their tag links.
    async fn delete_all_discussions(&self) -> Result<(), StoreError>;

    async fn create_discussion(&self, discussion: NewDiscussion) -> Result<(), StoreError>;

    async fn count_discussion_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError>;

    async fn tag_discussion(&self, discussion_id: i64, tag_id: i64) -> Result<(), StoreError>;

    async fn update_discussion_stats(
        &self,
        discussion_id: i64,
        stats: DiscussionStats,
    ) -> Result<(), StoreError>;

    // Posts

    /// Insert a post and return its store-assigned id.
    async fn create_post(&self, post: NewPost) -> Result<i64, StoreError>;

    /// Posts of one discussion ordered by sequence number.
    async fn discussion_posts(&self, discussion_id: i64) -> Result<Vec<Post>, StoreError>;

    /// Append rendered attachment markup to a post's content.
    async fn append_post_content(&self, post_id: i64, suffix: &str) -> Result<(), StoreError>;

    // User counters

    async fn count_user_posts(&self, user_id: i64) -> Result<i64, StoreError>;

    async fn count_user_discussions(&self, user_id: i64) -> Result<i64, StoreError>;

    async fn update_user_stats(
        &self,
        user_id: i64,
        comment_count: i64,
        discussion_count: i64,
    ) -> Result<(), StoreError>;
}

/// Binary file storage on the target side.
///
/// Copies are attempted before any metadata row exists; a failure means the
/// asset is skipped, never that the owning entity fails.
pub trait AssetStore: Send + Sync {
    /// Copy a legacy avatar file into the avatar directory under `file_name`.
    fn store_avatar(&self, src: &Path, file_name: &str) -> Result<(), AssetError>;

    /// Copy a legacy upload into the upload directory at `dest_rel`
    /// (a relative path, subdirectories created on demand).
    fn store_upload(&self, src: &Path, dest_rel: &str) -> Result<(), AssetError>;

    /// Public URL for a stored upload.
    fn upload_url(&self, dest_rel: &str) -> String;
}

/// Optional attachment subsystem of the target forum.
///
/// Probed once at run start; when absent, attachment migration is skipped
/// entirely. `register` persists the upload metadata, links it to the post
/// and returns the preview markup to append to the post content.
#[async_trait]
pub trait UploadRegistry: Send + Sync {
    async fn register(&self, upload: NewUpload) -> Result<String, StoreError>;
}

/// Markup appended to a post for a registered upload: an inline image for
/// image MIME types, a plain link otherwise.
pub(crate) fn preview_markup(upload: &NewUpload) -> String {
    if upload.mime.starts_with("image/") {
        format!("![{}]({})", upload.base_name, upload.url)
    } else {
        format!("[{}]({})", upload.base_name, upload.url)
    }
}
