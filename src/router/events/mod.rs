//! Events-related HTTP API.
mod create;
mod delete;
mod get;
mod list;
mod save;
mod search;
mod update;

pub use list::EventPage;

use axum::routing::{delete as del, get, post, put};
use axum::{Router, middleware};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::AppState;
use crate::error::Result;
use crate::event::{Category, EventInput, PriceInput};
use crate::location::StoredLocation;
use crate::middleware::{identify, require_identity};

pub fn router(state: AppState) -> Router<AppState> {
    // Reads are public; a token is still decoded when present so responses
    // can carry the derived saved flag.
    let public = Router::new()
        .route("/", get(list::handler))
        .route("/search", get(search::handler))
        .route("/{event_id}", get(get::handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), identify));

    let protected = Router::new()
        .route("/", post(create::handler))
        .route("/{event_id}", put(update::handler))
        .route("/{event_id}", del(delete::handler))
        .route("/{event_id}/save", post(save::save_handler))
        .route("/{event_id}/save", del(save::unsave_handler))
        .route_layer(middleware::from_fn_with_state(state, require_identity));

    public.merge(protected)
}

/// Event payload for create and update.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Title must be 3 to 100 characters."
    ))]
    pub title: String,
    #[validate(length(
        min = 10,
        message = "Description must contain at least 10 characters."
    ))]
    pub description: String,
    // Validated as a string so an unknown category reports next to the
    // other field errors instead of failing the whole body parse.
    #[validate(custom(
        function = "validate_category",
        message = "Category is not part of the enumeration."
    ))]
    pub category: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub location: StoredLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

fn validate_category(value: &str) -> std::result::Result<(), ValidationError> {
    value
        .parse::<Category>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("category"))
}

impl EventBody {
    /// Turn a validated body into repository input.
    pub fn into_input(self) -> Result<EventInput> {
        let category = self.category.parse::<Category>().map_err(|_| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("category", ValidationError::new("category"));
            errors
        })?;

        Ok(EventInput {
            title: self.title.trim().to_owned(),
            description: self.description,
            category,
            date: self.date,
            location: self.location,
            price: self
                .price
                .map(PriceInput::into_label)
                .unwrap_or_else(|| "Free".to_owned()),
            image_url: self.image_url,
            source_url: self.source_url,
        })
    }
}
