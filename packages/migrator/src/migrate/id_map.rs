//! Legacy-id to target-id bookkeeping for one run.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Group,
    User,
    Tag,
    Discussion,
}

/// In-memory map from `(kind, source id)` to the id the entity got in the
/// target store.
///
/// Ids are preserved 1:1 today, so this degenerates to an existence check,
/// but cross-references go through it anyway: if destination ids ever have
/// to diverge, only this type changes. Lookups of unmigrated ids return
/// `None`; that is an expected outcome callers branch on, not an error.
#[derive(Debug, Default)]
pub struct IdMap {
    entries: HashMap<(EntityKind, i64), i64>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EntityKind, source_id: i64, target_id: i64) {
        self.entries.insert((kind, source_id), target_id);
    }

    pub fn lookup(&self, kind: EntityKind, source_id: i64) -> Option<i64> {
        self.entries.get(&(kind, source_id)).copied()
    }

    pub fn contains(&self, kind: EntityKind, source_id: i64) -> bool {
        self.entries.contains_key(&(kind, source_id))
    }
}
