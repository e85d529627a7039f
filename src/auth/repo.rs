use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by email (exact, case-sensitive).
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Create a new user. Returns `Ok(None)` when the email is already taken.
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>>;

    /// Replace the password hash and history in one write.
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, password_history, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, password_history, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, password_history, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(Some(user)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e).context("insert user"),
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, password_history = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(history)
        .execute(&self.db)
        .await
        .context("update password")?;
        Ok(())
    }
}
