//! Aggregate recomputation.
//!
//! Denormalized counters are recomputed from the rows actually written,
//! after a discussion's posts are flushed — not maintained incrementally.
//! A full recompute is self-healing against partial writes within a
//! discussion.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::store::{DiscussionStats, Post, TargetStore};

/// Derive a discussion's counters from its stored posts.
///
/// The first-post pointer is the lowest-sequence-number surviving post
/// (hidden or not); comment count, participant count and the last-post
/// pointer consider only non-hidden posts.
pub(crate) fn compute_discussion_stats(posts: &[Post]) -> DiscussionStats {
    let mut stats = DiscussionStats::default();

    stats.first_post_id = posts
        .iter()
        .min_by_key(|p| p.number)
        .map(|p| p.id);

    let visible: Vec<&Post> = posts.iter().filter(|p| p.hidden_at.is_none()).collect();
    stats.comment_count = visible.len() as i64;

    let participants: BTreeSet<i64> = visible.iter().filter_map(|p| p.user_id).collect();
    stats.participant_count = participants.len() as i64;

    if let Some(last) = visible.iter().max_by_key(|p| p.number) {
        stats.last_post_id = Some(last.id);
        stats.last_posted_at = Some(last.created_at);
        stats.last_posted_user_id = last.user_id;
    }

    stats
}

/// Recompute and persist one discussion's counters.
pub(crate) async fn refresh_discussion(
    store: &dyn TargetStore,
    discussion_id: i64,
) -> Result<(), StoreError> {
    let posts = store.discussion_posts(discussion_id).await?;
    let stats = compute_discussion_stats(&posts);
    store.update_discussion_stats(discussion_id, stats).await
}

/// Recompute and persist one user's comment and discussion counts from
/// migrated data.
pub(crate) async fn refresh_user(store: &dyn TargetStore, user_id: i64) -> Result<(), StoreError> {
    let comment_count = store.count_user_posts(user_id).await?;
    let discussion_count = store.count_user_discussions(user_id).await?;
    store
        .update_user_stats(user_id, comment_count, discussion_count)
        .await
}
