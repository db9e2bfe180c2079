//! Users phase: legacy accounts, their avatars and their group links.

use serde_json::json;
use tracing::warn;

use super::assets::migrate_avatar;
use super::context::RunContext;
use super::id_map::EntityKind;
use crate::error::MigrateError;
use crate::source::SourceUser;
use crate::store::NewUser;

/// Target user ids at or below this are built-in (the admin) and never
/// touched.
pub(crate) const RESERVED_TARGET_USER_MAX: i64 = 1;

/// Legacy group ids at or below this are reserved/system groups on the
/// target side and are never linked to migrated users.
pub(crate) const RESERVED_SOURCE_GROUP_MAX: i64 = 7;

pub(crate) async fn migrate_users(ctx: &mut RunContext) -> Result<(), MigrateError> {
    let rows = ctx.source.users().await?;
    if rows.is_empty() {
        return Ok(());
    }

    let store = ctx.store.clone();
    store.delete_users_above(RESERVED_TARGET_USER_MAX).await?;

    for row in rows {
        let avatar_path = if ctx.options.migrate_avatars && !row.avatar.is_empty() {
            migrate_avatar(ctx.assets.as_ref(), &ctx.legacy_root, row.uid, &row.avatar)
        } else {
            None
        };

        let user = NewUser {
            id: row.uid,
            username: row.username.clone(),
            email: row.email.clone(),
            joined_at: row.regdate,
            last_seen_at: row.lastvisit,
            discussion_count: row.threadnum,
            comment_count: row.postnum,
            legacy_password: legacy_password_blob(&row),
            avatar_path,
        };

        match store.create_user(user).await {
            Ok(()) => {
                ctx.ids.record(EntityKind::User, row.uid, row.uid);
                ctx.counts.users += 1;
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(user_id = row.uid, error = %err, "skipping rejected user");
                continue;
            }
        }

        if ctx.options.migrate_user_groups {
            link_user_groups(ctx, &row).await?;
        }
    }

    Ok(())
}

/// The legacy hash is stored opaquely for lazy re-verification at first
/// login; it is never re-hashed during migration.
fn legacy_password_blob(row: &SourceUser) -> Option<String> {
    row.password.as_deref().filter(|p| !p.is_empty()).map(|p| {
        json!({
            "type": "bcrypt",
            "password": p,
        })
        .to_string()
    })
}

/// Membership set: the primary group plus whatever parses out of the
/// comma-separated extras, filtered down to non-reserved, migrated groups.
async fn link_user_groups(ctx: &mut RunContext, row: &SourceUser) -> Result<(), MigrateError> {
    let mut group_ids = vec![row.usergroup];

    for entry in row
        .additionalgroups
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        match parse_group_reference(entry) {
            Ok(gid) => group_ids.push(gid),
            Err(err) => {
                warn!(user_id = row.uid, error = %err, "skipping additional group reference")
            }
        }
    }

    for gid in group_ids {
        if gid <= RESERVED_SOURCE_GROUP_MAX {
            continue;
        }
        let Some(target_gid) = ctx.ids.lookup(EntityKind::Group, gid) else {
            warn!(user_id = row.uid, group_id = gid, "user references an unmigrated group");
            continue;
        };

        match ctx.store.add_user_to_group(row.uid, target_gid).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(user_id = row.uid, group_id = gid, error = %err, "skipping group link")
            }
        }
    }

    Ok(())
}

fn parse_group_reference(entry: &str) -> Result<i64, MigrateError> {
    entry
        .parse()
        .map_err(|_| MigrateError::MalformedReference {
            value: entry.to_string(),
        })
}
