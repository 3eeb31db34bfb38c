//! Handle event database requests, including the saved-events relation.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::event::{Category, EventRow};
use crate::location::StoredLocation;

/// Validated event fields, ready to persist.
#[derive(Clone, Debug)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: chrono::DateTime<chrono::Utc>,
    pub location: StoredLocation,
    pub price: String,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
}

pub(crate) const EVENT_COLUMNS: &str = r#"e.id, e.title, e.description, e.category,
    e.date, e.location, e.price, e.image_url, e.source, e.source_url,
    e.created_by, e.created_at, e.updated_at"#;

#[derive(Clone)]
pub struct EventRepository {
    pub(super) pool: Pool<Postgres>,
}

impl EventRepository {
    /// Create a new [`EventRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new event owned by `creator`.
    pub async fn create(
        &self,
        input: &EventInput,
        creator: Uuid,
    ) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"INSERT INTO events
                (title, description, category, date, location, price,
                 image_url, source_url, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, title, description, category, date, location,
                    price, image_url, source, source_url, created_by,
                    created_at, updated_at"#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.date)
        .bind(sqlx::types::Json(&input.location))
        .bind(&input.price)
        .bind(&input.image_url)
        .bind(&input.source_url)
        .bind(creator)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Fetch one event. When `requester` is set the row carries the derived
    /// `is_saved` membership flag; anonymous callers get none.
    pub async fn get(
        &self,
        event_id: Uuid,
        requester: Option<Uuid>,
    ) -> Result<EventRow> {
        let query = format!(
            r#"SELECT {EVENT_COLUMNS},
                CASE WHEN $2::uuid IS NULL THEN NULL
                    ELSE EXISTS(SELECT 1 FROM saved_events s
                        WHERE s.event_id = e.id AND s.user_id = $2)
                END AS is_saved
                FROM events e WHERE e.id = $1"#
        );

        sqlx::query_as::<_, EventRow>(&query)
            .bind(event_id)
            .bind(requester)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound { entity: "event" })
    }

    /// Replace the mutable fields of an event. Only its creator may do so;
    /// existence is not hidden from a non-owner.
    pub async fn update(
        &self,
        event_id: Uuid,
        input: &EventInput,
        requester: Uuid,
    ) -> Result<EventRow> {
        self.check_ownership(event_id, requester).await?;

        let row = sqlx::query_as::<_, EventRow>(
            r#"UPDATE events
                SET title = $1, description = $2, category = $3, date = $4,
                    location = $5, price = $6, image_url = $7,
                    source_url = $8, updated_at = NOW()
                WHERE id = $9
                RETURNING id, title, description, category, date, location,
                    price, image_url, source, source_url, created_by,
                    created_at, updated_at"#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.date)
        .bind(sqlx::types::Json(&input.location))
        .bind(&input.price)
        .bind(&input.image_url)
        .bind(&input.source_url)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete an event and prune it from every saved list. Both effects
    /// land in one transaction: a reader never observes the event gone but
    /// still referenced, and a retry after a timeout is a plain no-op on
    /// the already-pruned rows.
    pub async fn delete(&self, event_id: Uuid, requester: Uuid) -> Result<()> {
        self.check_ownership(event_id, requester).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(r#"DELETE FROM saved_events WHERE event_id = $1"#)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r#"DELETE FROM events WHERE id = $1"#)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Add an event to a user's saved set. Membership is conditional at the
    /// storage layer, so two racing saves cannot produce duplicates; the
    /// loser of the race (or a repeat call) gets a conflict, not a no-op.
    pub async fn save(&self, user_id: Uuid, event_id: Uuid) -> Result<()> {
        if !self.exists(event_id).await? {
            return Err(ServerError::NotFound { entity: "event" });
        }

        let result = sqlx::query(
            r#"INSERT INTO saved_events (user_id, event_id)
                VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::Conflict("event is already saved"));
        }

        Ok(())
    }

    /// Remove an event from a user's saved set.
    pub async fn unsave(&self, user_id: Uuid, event_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"DELETE FROM saved_events
                WHERE user_id = $1 AND event_id = $2"#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::Conflict("event is not saved"));
        }

        Ok(())
    }

    async fn exists(&self, event_id: Uuid) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)"#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn check_ownership(
        &self,
        event_id: Uuid,
        requester: Uuid,
    ) -> Result<()> {
        let creator: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT created_by FROM events WHERE id = $1"#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        match creator {
            None => Err(ServerError::NotFound { entity: "event" }),
            Some((creator,)) if creator != requester => Err(
                ServerError::Forbidden("only the event creator may do this"),
            ),
            Some(_) => Ok(()),
        }
    }
}
