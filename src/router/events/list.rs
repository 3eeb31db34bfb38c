//! List events with filters and pagination.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::event::{
    Category, Event, EventRepository, EventRow, ListFilter, Pagination,
};
use crate::middleware::OptionalIdentity;
use crate::router::{Success, success};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub saved: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of normalized events.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
    pub total_pages: u32,
    pub page: u32,
    pub limit: u32,
    /// How many events on this page have no usable coordinates. Map
    /// consumers surface this instead of pinning a made-up position.
    pub unmapped: usize,
}

impl EventPage {
    pub fn new(
        rows: Vec<EventRow>,
        total: i64,
        pagination: Pagination,
    ) -> Self {
        let events: Vec<Event> = rows.into_iter().map(Event::from).collect();
        let unmapped = events
            .iter()
            .filter(|event| event.location.coordinates.is_none())
            .count();

        Self {
            events,
            total,
            total_pages: pagination.total_pages(total),
            page: pagination.page(),
            limit: pagination.limit(),
            unmapped,
        }
    }
}

pub async fn handler(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Query(params): Query<Params>,
) -> Result<Json<Success<EventPage>>> {
    let repo = EventRepository::new(state.db.postgres.clone());
    let requester = identity.map(|identity| identity.0);

    let filter = ListFilter {
        category: params.category,
        search: params.search,
        created_by: params.created_by,
        saved_only: params.saved,
    };
    let pagination = Pagination::new(params.page, params.limit)?;

    let (rows, total) = repo.list(&filter, pagination, requester).await?;

    Ok(success(EventPage::new(rows, total, pagination)))
}
