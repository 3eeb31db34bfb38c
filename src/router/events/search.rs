//! Free-text event search.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::AppState;
use crate::error::Result;
use crate::event::{EventRepository, Pagination};
use crate::middleware::OptionalIdentity;
use crate::router::events::EventPage;
use crate::router::{Success, success};

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn handler(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Query(params): Query<Params>,
) -> Result<Json<Success<EventPage>>> {
    let repo = EventRepository::new(state.db.postgres.clone());
    let requester = identity.map(|identity| identity.0);

    let pagination = Pagination::new(params.page, params.limit)?;
    let (rows, total) =
        repo.search(&params.q, pagination, requester).await?;

    Ok(success(EventPage::new(rows, total, pagination)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::{app, make_request, router};

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_blank_query_is_rejected(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        for path in ["/events/search", "/events/search?q=", "/events/search?q=%20%20"] {
            let response = make_request(
                app.clone(),
                Method::GET,
                path,
                None,
                String::default(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/events.sql"))]
    async fn test_search_spans_title_description_and_category(
        pool: Pool<Postgres>,
    ) {
        let app = app(router::state(pool));

        let cases = [
            ("jazz", 1),     // title.
            ("lecture", 1),  // also in the description.
            ("sports", 2),   // category only.
            ("quidditch", 0),
        ];
        for (needle, expected) in cases {
            let response = make_request(
                app.clone(),
                Method::GET,
                &format!("/events/search?q={needle}"),
                None,
                String::default(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);

            let body =
                response.into_body().collect().await.unwrap().to_bytes();
            let body: crate::router::Success<EventPage> =
                serde_json::from_slice(&body).unwrap();
            assert_eq!(body.data.total, expected, "needle: {needle}");
        }
    }
}
