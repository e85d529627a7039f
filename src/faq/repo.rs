use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::faq::repo_types::{Faq, FaqContent, FaqFilter, FaqRow};

/// Persistence for FAQ records. Every read returns the owner expanded.
///
/// Writes are single statements; concurrent edits to one record are last-write-wins.
#[async_trait]
pub trait FaqRepo: Send + Sync {
    async fn insert(&self, owner_id: Uuid, content: &FaqContent) -> anyhow::Result<Faq>;

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Faq>>;

    /// One page in insertion order, plus the total number of matches.
    async fn list(
        &self,
        filter: &FaqFilter,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Faq>, i64)>;

    async fn update_content(&self, id: Uuid, content: &FaqContent) -> anyhow::Result<Option<Faq>>;

    /// Sets `deleted_at`; `is_deleted` follows it in the same write.
    async fn set_deleted_at(
        &self,
        id: Uuid,
        deleted_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgFaqRepo {
    db: PgPool,
}

impl PgFaqRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_JOINED: &str = r#"
    SELECT f.id, f.user_id, u.name AS owner_name, f.question, f.answer, f.category,
           f.is_deleted, f.deleted_at, f.created_at, f.updated_at
"#;

const LIST_WHERE: &str = r#"
     WHERE ($1 OR NOT f.is_deleted)
       AND ($2::text IS NULL
            OR f.question ILIKE $2
            OR f.answer   ILIKE $2
            OR f.category ILIKE $2)
"#;

#[async_trait]
impl FaqRepo for PgFaqRepo {
    async fn insert(&self, owner_id: Uuid, content: &FaqContent) -> anyhow::Result<Faq> {
        let sql = format!(
            r#"
            WITH f AS (
                INSERT INTO faqs (id, user_id, question, answer, category)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            {SELECT_JOINED}
              FROM f
              JOIN users u ON u.id = f.user_id
            "#
        );
        let row = sqlx::query_as::<_, FaqRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&content.question)
            .bind(&content.answer)
            .bind(&content.category)
            .fetch_one(&self.db)
            .await
            .context("insert faq")?;
        Ok(row.into())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Faq>> {
        let sql = format!(
            r#"
            {SELECT_JOINED}
              FROM faqs f
              JOIN users u ON u.id = f.user_id
             WHERE f.id = $1
            "#
        );
        let row = sqlx::query_as::<_, FaqRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find faq")?;
        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &FaqFilter,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Faq>, i64)> {
        let pattern = filter.like_pattern();

        let sql = format!(
            r#"
            {SELECT_JOINED}
              FROM faqs f
              JOIN users u ON u.id = f.user_id
            {LIST_WHERE}
             ORDER BY f.seq ASC
             LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, FaqRow>(&sql)
            .bind(filter.show_deleted)
            .bind(pattern.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .context("list faqs")?;

        let count_sql = format!("SELECT COUNT(*) FROM faqs f {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.show_deleted)
            .bind(pattern.as_deref())
            .fetch_one(&self.db)
            .await
            .context("count faqs")?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update_content(&self, id: Uuid, content: &FaqContent) -> anyhow::Result<Option<Faq>> {
        let sql = format!(
            r#"
            WITH f AS (
                UPDATE faqs
                   SET question = $2, answer = $3, category = $4, updated_at = now()
                 WHERE id = $1
                RETURNING *
            )
            {SELECT_JOINED}
              FROM f
              JOIN users u ON u.id = f.user_id
            "#
        );
        let row = sqlx::query_as::<_, FaqRow>(&sql)
            .bind(id)
            .bind(&content.question)
            .bind(&content.answer)
            .bind(&content.category)
            .fetch_optional(&self.db)
            .await
            .context("update faq")?;
        Ok(row.map(Into::into))
    }

    async fn set_deleted_at(
        &self,
        id: Uuid,
        deleted_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE faqs
               SET deleted_at = $2::timestamptz,
                   is_deleted = ($2::timestamptz IS NOT NULL),
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(deleted_at)
        .execute(&self.db)
        .await
        .context("set faq deleted_at")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete faq")?;
        Ok(res.rows_affected() > 0)
    }
}
