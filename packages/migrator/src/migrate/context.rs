//! Run-scoped state threaded through every phase. No process-wide
//! singletons: everything a phase touches hangs off [`RunContext`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::id_map::IdMap;
use super::{MigrationOptions, MigrationSummary};
use crate::error::MigrateError;
use crate::source::SourceForum;
use crate::store::{AssetStore, TargetStore, UploadRegistry};

/// Cooperative cancellation flag, checked at phase and discussion
/// boundaries only — a stopped run never leaves a discussion half-populated.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), MigrateError> {
        if self.is_cancelled() {
            Err(MigrateError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything one migration run owns.
pub struct RunContext {
    pub source: Arc<dyn SourceForum>,
    pub store: Arc<dyn TargetStore>,
    pub assets: Arc<dyn AssetStore>,
    /// Attachment subsystem when the target forum has one; probed once at
    /// startup, `None` means attachment migration is skipped entirely.
    pub uploads: Option<Arc<dyn UploadRegistry>>,
    /// Filesystem root where the legacy forum keeps avatars and uploads
    pub legacy_root: PathBuf,
    pub options: MigrationOptions,
    pub ids: IdMap,
    pub counts: MigrationSummary,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(
        source: Arc<dyn SourceForum>,
        store: Arc<dyn TargetStore>,
        assets: Arc<dyn AssetStore>,
        uploads: Option<Arc<dyn UploadRegistry>>,
        legacy_root: PathBuf,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            store,
            assets,
            uploads,
            legacy_root,
            options,
            ids: IdMap::new(),
            counts: MigrationSummary::default(),
            cancel: CancelToken::new(),
        }
    }
}
