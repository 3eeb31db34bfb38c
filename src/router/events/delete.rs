//! Delete an event. Creator only; saved lists are pruned with it.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::event::EventRepository;
use crate::middleware::Identity;
use crate::router::{Success, success};

pub async fn handler(
    State(state): State<AppState>,
    Identity(requester): Identity,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Success<()>>> {
    let repo = EventRepository::new(state.db.postgres.clone());

    repo.delete(event_id, requester).await?;

    tracing::info!(%event_id, deleted_by = %requester, "event deleted");

    Ok(success(()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    use crate::{app, make_request, router};

    const U1: Uuid = Uuid::from_u128(1);
    const U2: Uuid = Uuid::from_u128(2);
    const E1: &str = "10000000-0000-0000-0000-000000000001";

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_only_the_creator_may_delete(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let path = format!("/events/{E1}");

        // E1 was created by U1; U2 is rejected without hiding existence.
        let intruder = state.token.create(U2).unwrap();
        let response = make_request(
            app.clone(),
            Method::DELETE,
            &path,
            Some(&intruder),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let owner = state.token.create(U1).unwrap();
        let response = make_request(
            app.clone(),
            Method::DELETE,
            &path,
            Some(&owner),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app,
            Method::GET,
            &path,
            None,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_delete_prunes_every_saved_list(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        // Both users save E1.
        for user in [U1, U2] {
            let token = state.token.create(user).unwrap();
            let response = make_request(
                app.clone(),
                Method::POST,
                &format!("/events/{E1}/save"),
                Some(&token),
                String::default(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let owner = state.token.create(U1).unwrap();
        let response = make_request(
            app.clone(),
            Method::DELETE,
            &format!("/events/{E1}"),
            Some(&owner),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let (remaining,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM saved_events WHERE event_id = $1",
        )
        .bind(Uuid::parse_str(E1).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_of_missing_event_is_not_found(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(U1).unwrap();

        let response = make_request(
            app,
            Method::DELETE,
            &format!("/events/{}", Uuid::new_v4()),
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
