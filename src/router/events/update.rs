//! Update an event. Creator only.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::event::{Event, EventRepository};
use crate::middleware::Identity;
use crate::router::events::EventBody;
use crate::router::{Success, Valid, success};

pub async fn handler(
    State(state): State<AppState>,
    Identity(requester): Identity,
    Path(event_id): Path<Uuid>,
    Valid(body): Valid<EventBody>,
) -> Result<Json<Success<Event>>> {
    let repo = EventRepository::new(state.db.postgres.clone());

    let input = body.into_input()?;
    let row = repo.update(event_id, &input, requester).await?;

    Ok(success(Event::from(row)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    use super::*;
    use crate::router::Success;
    use crate::{app, make_request, router};

    const U1: Uuid = Uuid::from_u128(1);
    const U2: Uuid = Uuid::from_u128(2);
    const E1: &str = "10000000-0000-0000-0000-000000000001";

    fn patched() -> String {
        json!({
            "title": "Intramural Grand Finals",
            "description": "Basketball finals at the athletic center.",
            "category": "sports",
            "date": "2030-01-01T18:00:00Z",
            "location": {
                "name": "Athletic Center",
                "address": "1 Court Way",
                "coordinates": [-73.9950, 40.7315],
            },
            "price": 10,
        })
        .to_string()
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_only_the_creator_may_update(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let path = format!("/events/{E1}");

        let intruder = state.token.create(U2).unwrap();
        let response = make_request(
            app.clone(),
            Method::PUT,
            &path,
            Some(&intruder),
            patched(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let owner = state.token.create(U1).unwrap();
        let response =
            make_request(app, Method::PUT, &path, Some(&owner), patched())
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Success<Event> = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.data.title, "Intramural Grand Finals");
        assert_eq!(body.data.price, "10");
        assert_eq!(body.data.created_by, U1);
        assert!(body.data.updated_at >= body.data.created_at);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_update_revalidates_fields(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let owner = state.token.create(U1).unwrap();

        let response = make_request(
            app,
            Method::PUT,
            &format!("/events/{E1}"),
            Some(&owner),
            json!({
                "title": "ok",
                "description": "too short",
                "category": "sports",
                "date": "2030-01-01T18:00:00Z",
                "location": "somewhere",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
