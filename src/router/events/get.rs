//! Fetch one event.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::event::{Event, EventRepository};
use crate::middleware::OptionalIdentity;
use crate::router::{Success, success};

pub async fn handler(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Success<Event>>> {
    let repo = EventRepository::new(state.db.postgres.clone());
    let requester = identity.map(|identity| identity.0);

    let row = repo.get(event_id, requester).await?;

    Ok(success(Event::from(row)))
}
