//! Groups phase: legacy custom user groups become target groups.

use tracing::warn;

use super::color::random_color;
use super::context::RunContext;
use super::id_map::EntityKind;
use crate::error::MigrateError;
use crate::store::NewGroup;

/// Target group ids at or below this are built-in and never touched.
pub(crate) const RESERVED_TARGET_GROUP_MAX: i64 = 4;

pub(crate) async fn migrate_groups(ctx: &mut RunContext) -> Result<(), MigrateError> {
    let rows = ctx.source.custom_groups().await?;
    if rows.is_empty() {
        return Ok(());
    }

    let store = ctx.store.clone();
    store.delete_groups_above(RESERVED_TARGET_GROUP_MAX).await?;

    for row in rows {
        let group = NewGroup {
            id: row.gid,
            name_singular: row.title.clone(),
            name_plural: row.title,
            color: random_color(),
        };

        match store.create_group(group).await {
            Ok(()) => {
                ctx.ids.record(EntityKind::Group, row.gid, row.gid);
                ctx.counts.groups += 1;
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(group_id = row.gid, error = %err, "skipping rejected group"),
        }
    }

    Ok(())
}
