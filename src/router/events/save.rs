//! Saved-events relation routes.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::event::EventRepository;
use crate::middleware::Identity;
use crate::router::{Success, success};

/// `POST /events/{id}/save` adds the event to the caller's saved set.
pub async fn save_handler(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Success<()>>> {
    let repo = EventRepository::new(state.db.postgres.clone());

    repo.save(user_id, event_id).await?;

    Ok(success(()))
}

/// `DELETE /events/{id}/save` removes it again.
pub async fn unsave_handler(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Success<()>>> {
    let repo = EventRepository::new(state.db.postgres.clone());

    repo.unsave(user_id, event_id).await?;

    Ok(success(()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    use crate::{app, make_request, router};

    const U1: Uuid = Uuid::from_u128(1);
    const E1: &str = "10000000-0000-0000-0000-000000000001";

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_repeat_save_conflicts_then_cycle_recovers(
        pool: Pool<Postgres>,
    ) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(U1).unwrap();
        let path = format!("/events/{E1}/save");

        let response = make_request(
            app.clone(),
            Method::POST,
            &path,
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // A repeat save is an error, not a no-op.
        let response = make_request(
            app.clone(),
            Method::POST,
            &path,
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Unsave then save again succeeds.
        let response = make_request(
            app.clone(),
            Method::DELETE,
            &path,
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = make_request(
            app,
            Method::POST,
            &path,
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_unsave_of_not_saved_event_conflicts(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(U1).unwrap();

        let response = make_request(
            app,
            Method::DELETE,
            &format!("/events/{E1}/save"),
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_save_of_missing_event_is_not_found(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(U1).unwrap();

        let response = make_request(
            app,
            Method::POST,
            &format!("/events/{}/save", Uuid::new_v4()),
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_saved_filter_returns_only_saved_events(
        pool: Pool<Postgres>,
    ) {
        use http_body_util::BodyExt;

        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(U1).unwrap();

        let response = make_request(
            app.clone(),
            Method::POST,
            &format!("/events/{E1}/save"),
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app,
            Method::GET,
            "/events?saved=true",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: crate::router::Success<crate::router::events::EventPage> =
            serde_json::from_slice(&body).unwrap();
        assert_eq!(body.data.total, 1);
        assert_eq!(body.data.events[0].id.to_string(), E1);
        assert_eq!(body.data.events[0].is_saved, Some(true));
    }
}
