//! Target-side entity records.
//!
//! `New*` structs are what the transformers hand to the store; `Tag` and
//! `Post` also come back out for reference resolution and aggregate
//! recomputation.

use chrono::{DateTime, Utc};

/// A user group to create. Id is preserved from the source.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub id: i64,
    pub name_singular: String,
    pub name_plural: String,
    /// `#rrggbb`
    pub color: String,
}

/// A user to create. Id is preserved from the source.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub discussion_count: i64,
    pub comment_count: i64,
    /// Opaque JSON blob wrapping the legacy hash, for lazy re-verification
    pub legacy_password: Option<String>,
    /// File name inside the target avatar directory
    pub avatar_path: Option<String>,
}

/// A tag (category) to create. Id is preserved from the source forum id.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: String,
    pub position: i64,
    pub parent_id: Option<i64>,
}

/// A tag as stored, fetched back for parent-chain walks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

/// A discussion to create. Id is preserved from the source thread id.
#[derive(Debug, Clone)]
pub struct NewDiscussion {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Unset when the owning user was never migrated
    pub user_id: Option<i64>,
    pub is_locked: bool,
    pub is_sticky: bool,
    pub created_at: DateTime<Utc>,
    pub hidden_at: Option<DateTime<Utc>>,
}

/// A post to create; the store assigns its id.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub discussion_id: i64,
    pub user_id: Option<i64>,
    /// 1-based position within the discussion
    pub number: i64,
    /// Carried verbatim from the source
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub hidden_at: Option<DateTime<Utc>>,
}

/// A post as stored, fetched back for aggregate recomputation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub discussion_id: i64,
    pub user_id: Option<i64>,
    pub number: i64,
    pub created_at: DateTime<Utc>,
    pub hidden_at: Option<DateTime<Utc>>,
}

/// Denormalized discussion counters, recomputed from stored posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionStats {
    pub first_post_id: Option<i64>,
    pub last_post_id: Option<i64>,
    pub last_posted_at: Option<DateTime<Utc>>,
    pub last_posted_user_id: Option<i64>,
    pub comment_count: i64,
    pub participant_count: i64,
}

/// A physical file already copied into target storage, to be registered
/// with the upload subsystem.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Uploading user, when migrated
    pub actor_id: Option<i64>,
    pub post_id: i64,
    /// Sanitized user-facing file name
    pub base_name: String,
    /// Path relative to the target upload directory
    pub path: String,
    pub mime: String,
    pub size: i64,
    pub url: String,
}
