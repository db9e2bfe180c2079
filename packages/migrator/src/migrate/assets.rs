//! Asset migration helpers: avatar files and attachment binaries.
//!
//! Copy failures are warnings, never fatal: the owning user or post is
//! migrated without the asset.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::store::AssetStore;

/// Copy a legacy avatar into the target avatar directory and return the
/// file name to link, or `None` when the copy failed.
///
/// Legacy avatar paths carry a cache-busting query string
/// (`images/avatars/12.png?dateline=...`) that is stripped before the copy.
pub(crate) fn migrate_avatar(
    assets: &dyn AssetStore,
    legacy_root: &Path,
    user_id: i64,
    raw_avatar: &str,
) -> Option<String> {
    let relative = strip_query(raw_avatar);
    let src = legacy_root.join(relative);
    let file_name = src.file_name()?.to_string_lossy().into_owned();

    match assets.store_avatar(&src, &file_name) {
        Ok(()) => Some(file_name),
        Err(err) => {
            warn!(user_id, avatar = raw_avatar, error = %err, "user migrated without avatar");
            None
        }
    }
}

/// Where a legacy attachment binary lives on disk.
pub(crate) fn attachment_source(legacy_root: &Path, attach_name: &str) -> PathBuf {
    legacy_root.join("uploads").join(attach_name)
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}
