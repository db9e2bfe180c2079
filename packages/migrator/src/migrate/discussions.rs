//! Discussions phase: threads, their posts, attachments and the aggregate
//! refresh that follows each one.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::warn;

use super::{aggregates, ancestry, posts};
use super::context::RunContext;
use super::id_map::EntityKind;
use super::slug::{slugify, with_collision_suffix};
use crate::error::MigrateError;
use crate::store::NewDiscussion;

pub(crate) async fn migrate_discussions(ctx: &mut RunContext) -> Result<(), MigrateError> {
    let rows = ctx
        .source
        .threads(ctx.options.include_soft_deleted_threads)
        .await?;
    if rows.is_empty() {
        return Ok(());
    }

    let store = ctx.store.clone();
    store.delete_all_discussions().await?;

    // Bound for ancestry walks: no legitimate parent chain is longer than
    // the number of tags that exist
    let tag_cap = store.count_tags().await? as usize;

    let mut users_to_refresh: BTreeSet<i64> = BTreeSet::new();

    for row in rows {
        // Stopping a long run never leaves a discussion half-populated
        ctx.cancel.check()?;

        let base = slugify(&row.subject);
        let existing = store.count_discussion_slugs_with_prefix(&base).await?;
        let owner = ctx.ids.lookup(EntityKind::User, row.uid);

        let discussion = NewDiscussion {
            id: row.tid,
            title: row.subject.clone(),
            slug: with_collision_suffix(&base, existing),
            user_id: owner,
            is_locked: row.closed == "1",
            is_sticky: row.sticky != 0,
            created_at: row.dateline,
            hidden_at: (row.visible == -1).then(Utc::now),
        };

        match store.create_discussion(discussion).await {
            Ok(()) => {
                ctx.ids.record(EntityKind::Discussion, row.tid, row.tid);
                ctx.counts.discussions += 1;
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(thread_id = row.tid, error = %err, "skipping rejected thread");
                continue;
            }
        }

        if let Some(uid) = owner {
            users_to_refresh.insert(uid);
        }

        attach_ancestor_tags(ctx, row.tid, row.fid, tag_cap).await?;

        posts::migrate_thread_posts(ctx, row.tid, &mut users_to_refresh).await?;

        match aggregates::refresh_discussion(store.as_ref(), row.tid).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(discussion_id = row.tid, error = %err, "discussion counters not refreshed")
            }
        }
    }

    for user_id in users_to_refresh {
        match aggregates::refresh_user(store.as_ref(), user_id).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(user_id, error = %err, "user counters not refreshed"),
        }
    }

    Ok(())
}

/// Attach the discussion to its originating tag and every ancestor above
/// it. A cycle in the parent data loses the tag attachment, not the
/// discussion.
async fn attach_ancestor_tags(
    ctx: &mut RunContext,
    discussion_id: i64,
    leaf_tag_id: i64,
    tag_cap: usize,
) -> Result<(), MigrateError> {
    let store = ctx.store.clone();

    let chain = match ancestry::collect_ancestry(store.as_ref(), leaf_tag_id, tag_cap).await {
        Ok(chain) => chain,
        Err(err @ MigrateError::TagCycle { .. }) => {
            warn!(discussion_id, tag_id = leaf_tag_id, error = %err, "discussion left untagged");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    for tag_id in chain {
        match store.tag_discussion(discussion_id, tag_id).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(discussion_id, tag_id, error = %err, "skipping tag link"),
        }
    }

    Ok(())
}
