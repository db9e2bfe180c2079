//! Read side of the migration: the legacy forum schema.
//!
//! The engine only sees the [`SourceForum`] trait; the Postgres
//! implementation lives in [`postgres`] and knows about table prefixes and
//! the legacy column layout.

mod postgres;

pub use postgres::PgSource;

use crate::error::MigrateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A custom user group row (`usergroups` with type = 2).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceGroup {
    pub gid: i64,
    pub title: String,
}

/// A legacy user row. Email is lowercased by the source query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceUser {
    pub uid: i64,
    pub username: String,
    pub email: String,
    pub postnum: i64,
    pub threadnum: i64,
    pub regdate: DateTime<Utc>,
    pub lastvisit: DateTime<Utc>,
    pub usergroup: i64,
    /// Comma-separated extra group ids; may contain junk entries
    pub additionalgroups: String,
    /// Relative avatar path, possibly with a cache-busting query string
    pub avatar: String,
    /// Legacy bcrypt hash, kept opaque for lazy re-verification
    pub password: Option<String>,
}

/// A forum/category row. Forums with a non-empty `linkto` are pure
/// redirects and have no migratable content.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceCategory {
    pub fid: i64,
    pub name: String,
    pub description: String,
    pub linkto: String,
    pub disporder: i64,
    /// Parent forum id; 0 means root
    pub pid: i64,
}

/// A thread row. `visible` = -1 marks a soft-deleted thread.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceThread {
    pub tid: i64,
    pub fid: i64,
    pub subject: String,
    pub dateline: DateTime<Utc>,
    pub uid: i64,
    pub lastpost: DateTime<Utc>,
    pub lastposteruid: i64,
    /// Boolean-like flag stored as text in the legacy schema
    pub closed: String,
    pub sticky: i64,
    pub visible: i64,
}

/// A post row. `visible` = -1 marks a soft-deleted post.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourcePost {
    pub pid: i64,
    pub tid: i64,
    pub dateline: DateTime<Utc>,
    pub uid: i64,
    pub message: String,
    pub visible: i64,
}

/// An attachment row for one post.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceAttachment {
    pub uid: i64,
    /// Physical file name under the legacy uploads directory
    pub attachname: String,
    /// Original user-facing file name (unsanitized)
    pub filename: String,
    pub filetype: String,
    pub filesize: i64,
}

/// Read access to the legacy forum schema.
///
/// Orderings matter where derived state depends on them: posts come back in
/// ascending source id order (sequence numbers), categories in ascending id
/// order. Every method maps query failures to
/// [`MigrateError::SourceQuery`], which is fatal to the running phase but
/// leaves committed phases untouched.
#[async_trait]
pub trait SourceForum: Send + Sync {
    /// Custom (non-builtin) user groups.
    async fn custom_groups(&self) -> Result<Vec<SourceGroup>, MigrateError>;

    /// All real users (skips the legacy bootstrap account).
    async fn users(&self) -> Result<Vec<SourceUser>, MigrateError>;

    /// All forums/categories, ordered by source id.
    async fn categories(&self) -> Result<Vec<SourceCategory>, MigrateError>;

    /// All threads, optionally including soft-deleted ones.
    async fn threads(&self, include_soft_deleted: bool) -> Result<Vec<SourceThread>, MigrateError>;

    /// Posts of one thread in source id order, optionally including
    /// soft-deleted ones.
    async fn thread_posts(
        &self,
        tid: i64,
        include_soft_deleted: bool,
    ) -> Result<Vec<SourcePost>, MigrateError>;

    /// Attachments of one post.
    async fn post_attachments(&self, pid: i64) -> Result<Vec<SourceAttachment>, MigrateError>;
}
