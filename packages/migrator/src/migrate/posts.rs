//! Posts of one thread, in source id order, numbered from 1.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::warn;

use super::attachments;
use super::context::RunContext;
use super::id_map::EntityKind;
use crate::error::MigrateError;
use crate::store::NewPost;

pub(crate) async fn migrate_thread_posts(
    ctx: &mut RunContext,
    thread_id: i64,
    participants: &mut BTreeSet<i64>,
) -> Result<(), MigrateError> {
    let rows = ctx
        .source
        .thread_posts(thread_id, ctx.options.include_soft_deleted_posts)
        .await?;

    let store = ctx.store.clone();

    for (index, row) in rows.into_iter().enumerate() {
        let author = ctx.ids.lookup(EntityKind::User, row.uid);

        let post = NewPost {
            discussion_id: thread_id,
            user_id: author,
            number: index as i64 + 1,
            // Content is carried verbatim; no reformatting
            content: row.message,
            created_at: row.dateline,
            hidden_at: (row.visible == -1).then(Utc::now),
        };

        let post_id = match store.create_post(post).await {
            Ok(id) => id,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(thread_id, source_post_id = row.pid, error = %err, "skipping rejected post");
                continue;
            }
        };

        ctx.counts.posts += 1;
        if let Some(uid) = author {
            participants.insert(uid);
        }

        if ctx.options.migrate_attachments {
            attachments::migrate_post_attachments(ctx, row.pid, post_id).await?;
        }
    }

    Ok(())
}
