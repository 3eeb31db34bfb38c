//! Handle user database requests.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a [`User`] and return it as stored. Emails are unique
    /// case-insensitively; callers lowercase before reaching here.
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password_phc: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (name, email, password)
                VALUES ($1, $2, $3)
                RETURNING id, name, email, password, created_at"#,
        )
        .bind(name)
        .bind(email)
        .bind(password_phc)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by `email`.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password, created_at
                FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by `id`.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password, created_at
                FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound { entity: "user" })
    }
}
