//! Create an event.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::Result;
use crate::event::{Event, EventRepository};
use crate::middleware::Identity;
use crate::router::events::EventBody;
use crate::router::{Success, Valid, success};

pub async fn handler(
    State(state): State<AppState>,
    Identity(creator): Identity,
    Valid(body): Valid<EventBody>,
) -> Result<(StatusCode, Json<Success<Event>>)> {
    let repo = EventRepository::new(state.db.postgres.clone());

    let input = body.into_input()?;
    let row = repo.create(&input, creator).await?;

    tracing::info!(event_id = %row.id, created_by = %creator, "event created");

    Ok((StatusCode::CREATED, success(Event::from(row))))
}
