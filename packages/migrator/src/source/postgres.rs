use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{
    SourceAttachment, SourceCategory, SourceForum, SourceGroup, SourcePost, SourceThread,
    SourceUser,
};
use crate::error::MigrateError;

/// Legacy schema reader backed by a Postgres pool.
///
/// The table prefix is formatted into the query text (prefixes are trusted
/// operator input); all row values go through bind parameters. Integer
/// columns are cast to `bigint` because the legacy schema mixes int widths.
pub struct PgSource {
    pool: PgPool,
    prefix: String,
}

impl PgSource {
    /// Connect to the legacy database. A failure here is fatal to the whole
    /// run ([`MigrateError::SourceUnavailable`]).
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, MigrateError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .map_err(MigrateError::SourceUnavailable)?;

        Ok(Self {
            pool,
            prefix: prefix.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

#[async_trait]
impl SourceForum for PgSource {
    async fn custom_groups(&self) -> Result<Vec<SourceGroup>, MigrateError> {
        sqlx::query_as::<_, SourceGroup>(&format!(
            "SELECT gid::bigint AS gid, title FROM {} WHERE type = 2",
            self.table("usergroups")
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(MigrateError::SourceQuery)
    }

    async fn users(&self) -> Result<Vec<SourceUser>, MigrateError> {
        sqlx::query_as::<_, SourceUser>(&format!(
            "SELECT uid::bigint AS uid, username, lower(email) AS email, \
                    postnum::bigint AS postnum, threadnum::bigint AS threadnum, \
                    to_timestamp(regdate) AS regdate, to_timestamp(lastvisit) AS lastvisit, \
                    usergroup::bigint AS usergroup, additionalgroups, avatar, password \
             FROM {} WHERE uid > 1",
            self.table("users")
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(MigrateError::SourceQuery)
    }

    async fn categories(&self) -> Result<Vec<SourceCategory>, MigrateError> {
        sqlx::query_as::<_, SourceCategory>(&format!(
            "SELECT fid::bigint AS fid, name, description, linkto, \
                    disporder::bigint AS disporder, pid::bigint AS pid \
             FROM {} ORDER BY fid",
            self.table("forums")
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(MigrateError::SourceQuery)
    }

    async fn threads(&self, include_soft_deleted: bool) -> Result<Vec<SourceThread>, MigrateError> {
        let mut query = format!(
            "SELECT tid::bigint AS tid, fid::bigint AS fid, subject, \
                    to_timestamp(dateline) AS dateline, uid::bigint AS uid, \
                    to_timestamp(lastpost) AS lastpost, lastposteruid::bigint AS lastposteruid, \
                    closed, sticky::bigint AS sticky, visible::bigint AS visible \
             FROM {}",
            self.table("threads")
        );
        if !include_soft_deleted {
            query.push_str(" WHERE visible != -1");
        }

        sqlx::query_as::<_, SourceThread>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(MigrateError::SourceQuery)
    }

    async fn thread_posts(
        &self,
        tid: i64,
        include_soft_deleted: bool,
    ) -> Result<Vec<SourcePost>, MigrateError> {
        let mut query = format!(
            "SELECT pid::bigint AS pid, tid::bigint AS tid, \
                    to_timestamp(dateline) AS dateline, uid::bigint AS uid, \
                    message, visible::bigint AS visible \
             FROM {} WHERE tid = $1",
            self.table("posts")
        );
        if !include_soft_deleted {
            query.push_str(" AND visible != -1");
        }
        query.push_str(" ORDER BY pid");

        sqlx::query_as::<_, SourcePost>(&query)
            .bind(tid)
            .fetch_all(&self.pool)
            .await
            .map_err(MigrateError::SourceQuery)
    }

    async fn post_attachments(&self, pid: i64) -> Result<Vec<SourceAttachment>, MigrateError> {
        sqlx::query_as::<_, SourceAttachment>(&format!(
            "SELECT uid::bigint AS uid, attachname, filename, filetype, \
                    filesize::bigint AS filesize \
             FROM {} WHERE pid = $1",
            self.table("attachments")
        ))
        .bind(pid)
        .fetch_all(&self.pool)
        .await
        .map_err(MigrateError::SourceQuery)
    }
}
