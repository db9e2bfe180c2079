//! Tag ancestry resolution.
//!
//! A discussion attached to a leaf tag is also attached to every ancestor
//! up to the root, so ancestor tags list the discussions of their subtrees.

use crate::error::MigrateError;
use crate::store::TargetStore;

/// Collect `leaf` and every ancestor above it, walking parent links through
/// the target store.
///
/// The walk fetches by id from the store (never from the run's id map), so
/// a child processed before its parent still resolves. It terminates when a
/// tag has no parent or cannot be found (treated as reaching a root), and
/// is capped at `cap` links — the total tag count — so a parent cycle in
/// the source data fails with [`MigrateError::TagCycle`] instead of looping.
pub(crate) async fn collect_ancestry(
    store: &dyn TargetStore,
    leaf: i64,
    cap: usize,
) -> Result<Vec<i64>, MigrateError> {
    let mut chain = Vec::new();
    let mut current = leaf;

    loop {
        let Some(tag) = store.find_tag(current).await? else {
            break;
        };
        chain.push(tag.id);

        match tag.parent_id {
            None => break,
            Some(parent) => {
                if chain.len() >= cap {
                    return Err(MigrateError::TagCycle { tag_id: leaf, cap });
                }
                current = parent;
            }
        }
    }

    Ok(chain)
}
