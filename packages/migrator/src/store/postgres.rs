use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::entities::{
    DiscussionStats, NewDiscussion, NewGroup, NewPost, NewTag, NewUpload, NewUser, Post, Tag,
};
use super::{preview_markup, TargetStore, UploadRegistry};
use crate::error::StoreError;

/// Target forum schema behind [`TargetStore`], written directly over sqlx.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(err: sqlx::Error) -> StoreError {
    StoreError::from_sqlx(err)
}

#[async_trait]
impl TargetStore for PgStore {
    async fn delete_groups_above(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM group_user WHERE group_id > $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM groups WHERE id > $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn create_group(&self, group: NewGroup) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO groups (id, name_singular, name_plural, color)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(group.id)
        .bind(group.name_singular)
        .bind(group.name_plural)
        .bind(group.color)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn delete_users_above(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM group_user WHERE user_id > $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM users WHERE id > $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (
                id, username, email, is_email_confirmed, joined_at, last_seen_at,
                discussion_count, comment_count, legacy_password, avatar_url
            ) VALUES ($1, $2, $3, TRUE, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(user.username)
        .bind(user.email)
        .bind(user.joined_at)
        .bind(user.last_seen_at)
        .bind(user.discussion_count)
        .bind(user.comment_count)
        .bind(user.legacy_password)
        .bind(user.avatar_path)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn add_user_to_group(&self, user_id: i64, group_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO group_user (user_id, group_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete_all_tags(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM discussion_tag")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM tags")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn create_tag(&self, tag: NewTag) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tags (id, name, slug, description, color, position, parent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(tag.id)
        .bind(tag.name)
        .bind(tag.slug)
        .bind(tag.description)
        .bind(tag.color)
        .bind(tag.position)
        .bind(tag.parent_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug, parent_id FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)
    }

    async fn count_tags(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(count.0)
    }

    async fn count_tag_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE slug LIKE $1 || '%'")
            .bind(prefix)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(count.0)
    }

    async fn delete_all_discussions(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM discussion_tag")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM posts")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM discussions")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn create_discussion(&self, discussion: NewDiscussion) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO discussions (
                id, title, slug, user_id, is_approved, is_locked, is_sticky,
                created_at, hidden_at
            ) VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7, $8)",
        )
        .bind(discussion.id)
        .bind(discussion.title)
        .bind(discussion.slug)
        .bind(discussion.user_id)
        .bind(discussion.is_locked)
        .bind(discussion.is_sticky)
        .bind(discussion.created_at)
        .bind(discussion.hidden_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn count_discussion_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM discussions WHERE slug LIKE $1 || '%'")
                .bind(prefix)
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(count.0)
    }

    async fn tag_discussion(&self, discussion_id: i64, tag_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO discussion_tag (discussion_id, tag_id) VALUES ($1, $2)")
            .bind(discussion_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_discussion_stats(
        &self,
        discussion_id: i64,
        stats: DiscussionStats,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE discussions
             SET first_post_id = $2, last_post_id = $3, last_posted_at = $4,
                 last_posted_user_id = $5, comment_count = $6, participant_count = $7
             WHERE id = $1",
        )
        .bind(discussion_id)
        .bind(stats.first_post_id)
        .bind(stats.last_post_id)
        .bind(stats.last_posted_at)
        .bind(stats.last_posted_user_id)
        .bind(stats.comment_count)
        .bind(stats.participant_count)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn create_post(&self, post: NewPost) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO posts (discussion_id, user_id, number, content, created_at, hidden_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(post.discussion_id)
        .bind(post.user_id)
        .bind(post.number)
        .bind(post.content)
        .bind(post.created_at)
        .bind(post.hidden_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.0)
    }

    async fn discussion_posts(&self, discussion_id: i64) -> Result<Vec<Post>, StoreError> {
        sqlx::query_as::<_, Post>(
            "SELECT id, discussion_id, user_id, number, created_at, hidden_at
             FROM posts WHERE discussion_id = $1 ORDER BY number",
        )
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn append_post_content(&self, post_id: i64, suffix: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE posts SET content = content || $2 WHERE id = $1")
            .bind(post_id)
            .bind(suffix)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn count_user_posts(&self, user_id: i64) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE user_id = $1 AND hidden_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(count.0)
    }

    async fn count_user_discussions(&self, user_id: i64) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM discussions WHERE user_id = $1 AND hidden_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(count.0)
    }

    async fn update_user_stats(
        &self,
        user_id: i64,
        comment_count: i64,
        discussion_count: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET comment_count = $2, discussion_count = $3 WHERE id = $1")
            .bind(user_id)
            .bind(comment_count)
            .bind(discussion_count)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

/// Attachment subsystem of the target forum, when installed.
///
/// Registers uploads in the `uploads` table and links them to posts.
pub struct PgUploads {
    pool: PgPool,
}

impl PgUploads {
    /// Capability probe: present only when the target schema carries the
    /// upload tables. Run once at startup, never per row.
    pub async fn probe(pool: &PgPool) -> Result<Option<Self>, StoreError> {
        let present: (bool,) =
            sqlx::query_as("SELECT to_regclass('uploads') IS NOT NULL")
                .fetch_one(pool)
                .await
                .map_err(StoreError::from_sqlx)?;

        Ok(present.0.then(|| Self { pool: pool.clone() }))
    }
}

#[async_trait]
impl UploadRegistry for PgUploads {
    async fn register(&self, upload: NewUpload) -> Result<String, StoreError> {
        let markup = preview_markup(&upload);

        let row: (i64,) = sqlx::query_as(
            "INSERT INTO uploads (uuid, actor_id, base_name, path, type, size, upload_method, url)
             VALUES ($1, $2, $3, $4, $5, $6, 'local', $7)
             RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(upload.actor_id)
        .bind(&upload.base_name)
        .bind(&upload.path)
        .bind(&upload.mime)
        .bind(upload.size)
        .bind(&upload.url)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        sqlx::query("INSERT INTO upload_post (upload_id, post_id) VALUES ($1, $2)")
            .bind(row.0)
            .bind(upload.post_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        Ok(markup)
    }
}
