//! Categories phase: legacy forums become target tags, keeping the tree.

use tracing::warn;

use super::color::random_color;
use super::context::RunContext;
use super::id_map::EntityKind;
use super::slug::{slugify, with_collision_suffix};
use crate::error::MigrateError;
use crate::store::NewTag;

pub(crate) async fn migrate_categories(ctx: &mut RunContext) -> Result<(), MigrateError> {
    let rows = ctx.source.categories().await?;
    if rows.is_empty() {
        return Ok(());
    }

    let store = ctx.store.clone();
    store.delete_all_tags().await?;

    for row in rows {
        // Redirect-only forums have no content to migrate
        if !row.linkto.is_empty() {
            continue;
        }

        let base = slugify(&row.name);
        let existing = store.count_tag_slugs_with_prefix(&base).await?;
        let tag = NewTag {
            id: row.fid,
            name: row.name,
            slug: with_collision_suffix(&base, existing),
            description: row.description,
            color: random_color(),
            position: row.disporder - 1,
            // Ids are preserved, so the parent reference carries over even
            // when the parent row has not been inserted yet
            parent_id: (row.pid != 0).then_some(row.pid),
        };

        match store.create_tag(tag).await {
            Ok(()) => {
                ctx.ids.record(EntityKind::Tag, row.fid, row.fid);
                ctx.counts.categories += 1;
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(forum_id = row.fid, error = %err, "skipping rejected category"),
        }
    }

    Ok(())
}
