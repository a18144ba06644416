//! # Postgres repositories
//!
//! Bind-style sqlx implementations of the persistence ports. Row counts are
//! checked on every write: an insert or delete that touches an unexpected
//! number of rows is a consistency anomaly, not a "not found".

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{Attachment, AttachmentRepo, PipelineError, PipelineResult, Post, PostRepo};

fn db_err(err: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(err.to_string())
}

pub struct PgPostRepo {
    pool: PgPool,
}

impl PgPostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn insert(&self, post: &Post) -> PipelineResult<()> {
        let result = sqlx::query(
            "INSERT INTO posts (id, user_id, text, topic_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.text)
        .bind(post.topic_id.0)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() != 1 {
            return Err(PipelineError::Persistence(format!(
                "post insert affected {} rows",
                result.rows_affected()
            )));
        }
        Ok(())
    }
}

pub struct PgAttachmentRepo {
    pool: PgPool,
}

impl PgAttachmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_attachment(row: &sqlx::postgres::PgRow) -> PipelineResult<Attachment> {
        Ok(Attachment {
            id: row.try_get("id").map_err(db_err)?,
            user_id: row.try_get("user_id").map_err(db_err)?,
            post_id: row.try_get("post_id").map_err(db_err)?,
            file_path: row.try_get("file_path").map_err(db_err)?,
            mime_type: row.try_get("mime_type").map_err(db_err)?,
        })
    }
}

#[async_trait]
impl AttachmentRepo for PgAttachmentRepo {
    async fn insert(&self, attachment: &Attachment) -> PipelineResult<()> {
        let result = sqlx::query(
            "INSERT INTO attachments (id, user_id, post_id, file_path, mime_type) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(attachment.id)
        .bind(attachment.user_id)
        .bind(attachment.post_id)
        .bind(&attachment.file_path)
        .bind(&attachment.mime_type)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() != 1 {
            return Err(PipelineError::Persistence(format!(
                "attachment insert affected {} rows",
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn find_by_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
    ) -> PipelineResult<Option<Attachment>> {
        let row = sqlx::query(
            "SELECT id, user_id, post_id, file_path, mime_type \
             FROM attachments WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(Self::row_to_attachment).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> PipelineResult<Vec<Attachment>> {
        let rows = sqlx::query(
            "SELECT id, user_id, post_id, file_path, mime_type \
             FROM attachments WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(Self::row_to_attachment).collect()
    }

    /// Exactly one row must go away. Zero (the row vanished between lookup
    /// and delete) or several (broken uniqueness) are anomalies.
    async fn delete(&self, id: Uuid) -> PipelineResult<()> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() != 1 {
            return Err(PipelineError::Persistence(format!(
                "attachment delete affected {} rows, expected exactly 1",
                result.rows_affected()
            )));
        }
        Ok(())
    }
}
