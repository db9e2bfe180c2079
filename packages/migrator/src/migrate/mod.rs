//! The migration engine: a dependency-ordered, destructive-and-idempotent
//! run over the legacy schema.
//!
//! Phases execute strictly in order (groups, users, categories, then
//! discussions with their posts and attachments) because later phases
//! reference entities created by earlier ones. A phase failure halts the
//! run; entities committed by earlier phases stay put — the run is
//! deliberately not one large transaction, so partial progress stays
//! inspectable and memory stays bounded.

mod aggregates;
mod ancestry;
mod assets;
mod attachments;
mod categories;
mod color;
mod context;
mod discussions;
mod groups;
mod id_map;
mod posts;
mod slug;
mod users;

pub use context::{CancelToken, RunContext};
pub use id_map::{EntityKind, IdMap};

use crate::error::MigrateError;
use serde::Serialize;
use tracing::info;

/// Which entity kinds a run migrates, and how.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    pub migrate_avatars: bool,
    pub migrate_user_groups: bool,
    pub include_soft_deleted_threads: bool,
    pub include_soft_deleted_posts: bool,
    /// Also requires the upload subsystem to be present on the target
    pub migrate_attachments: bool,
}

/// Per-kind counts of successfully migrated records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub groups: u64,
    pub users: u64,
    pub categories: u64,
    pub discussions: u64,
    pub posts: u64,
    pub attachments: u64,
}

/// Where the run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Idle,
    GroupsMigrating,
    UsersMigrating,
    CategoriesMigrating,
    DiscussionsMigrating,
    Done,
    Failed,
}

impl MigrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::GroupsMigrating => "groups",
            Self::UsersMigrating => "users",
            Self::CategoriesMigrating => "categories",
            Self::DiscussionsMigrating => "discussions",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// One migration run. Build a [`RunContext`], hand it over, call
/// [`run`](Migrator::run); counts accumulated so far stay readable through
/// [`summary`](Migrator::summary) even after a failure.
pub struct Migrator {
    ctx: RunContext,
    phase: MigrationPhase,
}

impl Migrator {
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx,
            phase: MigrationPhase::Idle,
        }
    }

    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    /// Handle for requesting cooperative cancellation from another task.
    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel.clone()
    }

    pub fn summary(&self) -> &MigrationSummary {
        &self.ctx.counts
    }

    /// Execute all enabled phases in dependency order.
    pub async fn run(&mut self) -> Result<MigrationSummary, MigrateError> {
        match self.run_phases().await {
            Ok(()) => {
                self.phase = MigrationPhase::Done;
                info!(summary = ?self.ctx.counts, "migration finished");
                Ok(self.ctx.counts.clone())
            }
            Err(err) => {
                self.phase = MigrationPhase::Failed;
                Err(err)
            }
        }
    }

    async fn run_phases(&mut self) -> Result<(), MigrateError> {
        self.enter(MigrationPhase::GroupsMigrating)?;
        groups::migrate_groups(&mut self.ctx).await?;

        self.enter(MigrationPhase::UsersMigrating)?;
        users::migrate_users(&mut self.ctx).await?;

        self.enter(MigrationPhase::CategoriesMigrating)?;
        categories::migrate_categories(&mut self.ctx).await?;

        self.enter(MigrationPhase::DiscussionsMigrating)?;
        discussions::migrate_discussions(&mut self.ctx).await?;

        Ok(())
    }

    fn enter(&mut self, phase: MigrationPhase) -> Result<(), MigrateError> {
        self.ctx.cancel.check()?;
        self.phase = phase;
        info!(phase = phase.as_str(), "starting migration phase");
        Ok(())
    }
}
