//! Typed errors for the migration engine.
//!
//! Uses `thiserror` for the engine taxonomy (not `anyhow`); the CLI wraps
//! these in `anyhow` for top-level reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can abort a migration run or one of its phases.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The legacy forum database could not be reached at startup
    #[error("cannot reach the legacy forum database: {0}")]
    SourceUnavailable(#[source] sqlx::Error),

    /// A query against the legacy schema failed mid-phase
    #[error("legacy forum query failed: {0}")]
    SourceQuery(#[source] sqlx::Error),

    /// The target store failed; fatal only for connection-level failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A tag parent chain kept going past the number of known tags
    #[error("parent chain of tag {tag_id} exceeded {cap} links, assuming a cycle")]
    TagCycle { tag_id: i64, cap: usize },

    /// A cross-entity reference could not be parsed (skip just that reference)
    #[error("malformed reference {value:?}")]
    MalformedReference { value: String },

    /// Cooperative cancellation was requested
    #[error("migration cancelled")]
    Cancelled,
}

/// Errors from the target data store.
///
/// Row-level rejections are skippable; connection-level failures abort the
/// running phase.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("target store connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("target store rejected the row: {0}")]
    Row(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether the owning phase must abort instead of skipping the row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            _ => Self::Row(err),
        }
    }
}

/// A binary asset could not be copied into the target storage.
///
/// Never fatal: the owning entity is migrated without the asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
