//! Shared in-memory fixtures: fake source forum, target store, asset store
//! and upload registry, so engine semantics are testable end to end without
//! a database.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::error::{AssetError, MigrateError, StoreError};
use crate::source::{
    SourceAttachment, SourceCategory, SourceForum, SourceGroup, SourcePost, SourceThread,
    SourceUser,
};
use crate::store::{
    preview_markup, AssetStore, DiscussionStats, NewDiscussion, NewGroup, NewPost, NewTag,
    NewUpload, NewUser, Post, TargetStore, Tag, UploadRegistry,
};

// ============================================================================
// Source fixture
// ============================================================================

/// A canned legacy forum. Filtering and ordering mirror the real reader.
#[derive(Default)]
pub(crate) struct MemorySource {
    pub groups: Vec<SourceGroup>,
    pub users: Vec<SourceUser>,
    pub categories: Vec<SourceCategory>,
    pub threads: Vec<SourceThread>,
    pub posts: Vec<SourcePost>,
    /// (post id, attachment)
    pub attachments: Vec<(i64, SourceAttachment)>,
}

#[async_trait]
impl SourceForum for MemorySource {
    async fn custom_groups(&self) -> Result<Vec<SourceGroup>, MigrateError> {
        Ok(self.groups.clone())
    }

    async fn users(&self) -> Result<Vec<SourceUser>, MigrateError> {
        Ok(self.users.clone())
    }

    async fn categories(&self) -> Result<Vec<SourceCategory>, MigrateError> {
        let mut rows = self.categories.clone();
        rows.sort_by_key(|c| c.fid);
        Ok(rows)
    }

    async fn threads(&self, include_soft_deleted: bool) -> Result<Vec<SourceThread>, MigrateError> {
        Ok(self
            .threads
            .iter()
            .filter(|t| include_soft_deleted || t.visible != -1)
            .cloned()
            .collect())
    }

    async fn thread_posts(
        &self,
        tid: i64,
        include_soft_deleted: bool,
    ) -> Result<Vec<SourcePost>, MigrateError> {
        let mut rows: Vec<SourcePost> = self
            .posts
            .iter()
            .filter(|p| p.tid == tid && (include_soft_deleted || p.visible != -1))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.pid);
        Ok(rows)
    }

    async fn post_attachments(&self, pid: i64) -> Result<Vec<SourceAttachment>, MigrateError> {
        Ok(self
            .attachments
            .iter()
            .filter(|(p, _)| *p == pid)
            .map(|(_, a)| a.clone())
            .collect())
    }
}

// ============================================================================
// Target store fixture
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct StoredDiscussion {
    pub row: NewDiscussion,
    pub stats: DiscussionStats,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredPost {
    pub post: Post,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    pub groups: Vec<NewGroup>,
    pub users: Vec<NewUser>,
    /// (user id, group id)
    pub group_user: Vec<(i64, i64)>,
    pub tags: Vec<NewTag>,
    pub discussions: Vec<StoredDiscussion>,
    /// (discussion id, tag id)
    pub discussion_tag: Vec<(i64, i64)>,
    pub posts: Vec<StoredPost>,
    next_post_id: i64,
}

impl StoreState {
    pub fn user(&self, id: i64) -> Option<&NewUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn discussion(&self, id: i64) -> Option<&StoredDiscussion> {
        self.discussions.iter().find(|d| d.row.id == id)
    }

    pub fn tags_of_discussion(&self, id: i64) -> Vec<i64> {
        self.discussion_tag
            .iter()
            .filter(|(d, _)| *d == id)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn groups_of_user(&self, id: i64) -> Vec<i64> {
        self.group_user
            .iter()
            .filter(|(u, _)| *u == id)
            .map(|(_, g)| *g)
            .collect()
    }
}

/// In-memory [`TargetStore`] with the same replace/count semantics as the
/// Postgres implementation.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn snapshot(&self) -> StoreState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn delete_groups_above(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.groups.retain(|g| g.id <= id);
        state.group_user.retain(|(_, g)| *g <= id);
        Ok(())
    }

    async fn create_group(&self, group: NewGroup) -> Result<(), StoreError> {
        self.state.lock().unwrap().groups.push(group);
        Ok(())
    }

    async fn delete_users_above(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.users.retain(|u| u.id <= id);
        state.group_user.retain(|(u, _)| *u <= id);
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<(), StoreError> {
        self.state.lock().unwrap().users.push(user);
        Ok(())
    }

    async fn add_user_to_group(&self, user_id: i64, group_id: i64) -> Result<(), StoreError> {
        self.state.lock().unwrap().group_user.push((user_id, group_id));
        Ok(())
    }

    async fn delete_all_tags(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.tags.clear();
        state.discussion_tag.clear();
        Ok(())
    }

    async fn create_tag(&self, tag: NewTag) -> Result<(), StoreError> {
        self.state.lock().unwrap().tags.push(tag);
        Ok(())
    }

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tags
            .iter()
            .find(|t| t.id == id)
            .map(|t| Tag {
                id: t.id,
                name: t.name.clone(),
                slug: t.slug.clone(),
                parent_id: t.parent_id,
            }))
    }

    async fn count_tags(&self) -> Result<i64, StoreError> {
        Ok(self.state.lock().unwrap().tags.len() as i64)
    }

    async fn count_tag_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tags
            .iter()
            .filter(|t| t.slug.starts_with(prefix))
            .count() as i64)
    }

    async fn delete_all_discussions(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.discussions.clear();
        state.discussion_tag.clear();
        state.posts.clear();
        Ok(())
    }

    async fn create_discussion(&self, discussion: NewDiscussion) -> Result<(), StoreError> {
        self.state.lock().unwrap().discussions.push(StoredDiscussion {
            row: discussion,
            stats: DiscussionStats::default(),
        });
        Ok(())
    }

    async fn count_discussion_slugs_with_prefix(&self, prefix: &str) -> Result<i64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .discussions
            .iter()
            .filter(|d| d.row.slug.starts_with(prefix))
            .count() as i64)
    }

    async fn tag_discussion(&self, discussion_id: i64, tag_id: i64) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .discussion_tag
            .push((discussion_id, tag_id));
        Ok(())
    }

    async fn update_discussion_stats(
        &self,
        discussion_id: i64,
        stats: DiscussionStats,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(d) = state.discussions.iter_mut().find(|d| d.row.id == discussion_id) {
            d.stats = stats;
        }
        Ok(())
    }

    async fn create_post(&self, post: NewPost) -> Result<i64, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_post_id += 1;
        let id = state.next_post_id;
        state.posts.push(StoredPost {
            post: Post {
                id,
                discussion_id: post.discussion_id,
                user_id: post.user_id,
                number: post.number,
                created_at: post.created_at,
                hidden_at: post.hidden_at,
            },
            content: post.content,
        });
        Ok(id)
    }

    async fn discussion_posts(&self, discussion_id: i64) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .state
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.post.discussion_id == discussion_id)
            .map(|p| p.post.clone())
            .collect();
        posts.sort_by_key(|p| p.number);
        Ok(posts)
    }

    async fn append_post_content(&self, post_id: i64, suffix: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.posts.iter_mut().find(|p| p.post.id == post_id) {
            p.content.push_str(suffix);
        }
        Ok(())
    }

    async fn count_user_posts(&self, user_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.post.user_id == Some(user_id) && p.post.hidden_at.is_none())
            .count() as i64)
    }

    async fn count_user_discussions(&self, user_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .discussions
            .iter()
            .filter(|d| d.row.user_id == Some(user_id) && d.row.hidden_at.is_none())
            .count() as i64)
    }

    async fn update_user_stats(
        &self,
        user_id: i64,
        comment_count: i64,
        discussion_count: i64,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(u) = state.users.iter_mut().find(|u| u.id == user_id) {
            u.comment_count = comment_count;
            u.discussion_count = discussion_count;
        }
        Ok(())
    }
}

// ============================================================================
// Asset store and upload registry fixtures
// ============================================================================

/// Fake asset storage: copies succeed only for files the test declared to
/// exist on the legacy side.
#[derive(Default)]
pub(crate) struct MemoryAssets {
    existing: HashSet<PathBuf>,
    pub avatars: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
}

impl MemoryAssets {
    pub fn with_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            existing: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn copy(&self, src: &Path) -> Result<(), AssetError> {
        if self.existing.contains(src) {
            Ok(())
        } else {
            Err(AssetError::Copy {
                path: src.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        }
    }
}

impl AssetStore for MemoryAssets {
    fn store_avatar(&self, src: &Path, file_name: &str) -> Result<(), AssetError> {
        self.copy(src)?;
        self.avatars.lock().unwrap().push(file_name.to_string());
        Ok(())
    }

    fn store_upload(&self, src: &Path, dest_rel: &str) -> Result<(), AssetError> {
        self.copy(src)?;
        self.uploads.lock().unwrap().push(dest_rel.to_string());
        Ok(())
    }

    fn upload_url(&self, dest_rel: &str) -> String {
        format!("http://forum.test/assets/files/{dest_rel}")
    }
}

/// Fake upload subsystem recording everything registered with it.
#[derive(Default)]
pub(crate) struct MemoryUploads {
    pub registered: Mutex<Vec<NewUpload>>,
}

#[async_trait]
impl UploadRegistry for MemoryUploads {
    async fn register(&self, upload: NewUpload) -> Result<String, StoreError> {
        let markup = preview_markup(&upload);
        self.registered.lock().unwrap().push(upload);
        Ok(markup)
    }
}

// ============================================================================
// Row builders
// ============================================================================

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_650_000_000 + secs, 0).unwrap()
}

pub(crate) fn group_row(gid: i64, title: &str) -> SourceGroup {
    SourceGroup {
        gid,
        title: title.to_string(),
    }
}

pub(crate) fn user_row(uid: i64, username: &str) -> SourceUser {
    SourceUser {
        uid,
        username: username.to_string(),
        email: format!("{username}@example.org"),
        postnum: 0,
        threadnum: 0,
        regdate: at(0),
        lastvisit: at(100),
        usergroup: 8,
        additionalgroups: String::new(),
        avatar: String::new(),
        password: None,
    }
}

pub(crate) fn category_row(fid: i64, name: &str, pid: i64) -> SourceCategory {
    SourceCategory {
        fid,
        name: name.to_string(),
        description: String::new(),
        linkto: String::new(),
        disporder: 1,
        pid,
    }
}

pub(crate) fn thread_row(tid: i64, fid: i64, subject: &str, uid: i64) -> SourceThread {
    SourceThread {
        tid,
        fid,
        subject: subject.to_string(),
        dateline: at(10),
        uid,
        lastpost: at(50),
        lastposteruid: uid,
        closed: "0".to_string(),
        sticky: 0,
        visible: 1,
    }
}

pub(crate) fn post_row(pid: i64, tid: i64, uid: i64, visible: i64) -> SourcePost {
    SourcePost {
        pid,
        tid,
        dateline: at(pid),
        uid,
        message: format!("post {pid}"),
        visible,
    }
}

pub(crate) fn attachment_row(uid: i64, attachname: &str, filename: &str, mime: &str) -> SourceAttachment {
    SourceAttachment {
        uid,
        attachname: attachname.to_string(),
        filename: filename.to_string(),
        filetype: mime.to_string(),
        filesize: 2048,
    }
}
