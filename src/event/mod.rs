mod query;
mod repository;

pub use query::*;
pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::{CanonicalLocation, StoredLocation};

/// Closed category enumeration. The set varies by deployment but is never
/// open-ended; anything outside it is a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Social,
    Cultural,
    Sports,
    Career,
    Music,
    Food,
    Arts,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Academic,
        Category::Social,
        Category::Cultural,
        Category::Sports,
        Category::Career,
        Category::Music,
        Category::Food,
        Category::Arts,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Academic => "academic",
            Category::Social => "social",
            Category::Cultural => "cultural",
            Category::Sports => "sports",
            Category::Career => "career",
            Category::Music => "music",
            Category::Food => "food",
            Category::Arts => "arts",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or(UnknownCategory)
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug)]
pub struct UnknownCategory;

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "category is not part of the enumeration")
    }
}

impl std::error::Error for UnknownCategory {}

/// Free-form price input: either a label or a numeric amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Amount(f64),
    Label(String),
}

impl PriceInput {
    /// Render to the stored label. A zero amount means free.
    pub fn into_label(self) -> String {
        match self {
            PriceInput::Amount(amount) if amount == 0.0 => "Free".to_owned(),
            PriceInput::Amount(amount) => format!("{amount}"),
            PriceInput::Label(label) if label.trim().is_empty() => {
                "Free".to_owned()
            },
            PriceInput::Label(label) => label,
        }
    }
}

/// Event as saved on database.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub date: chrono::DateTime<chrono::Utc>,
    #[sqlx(json)]
    pub location: StoredLocation,
    pub price: String,
    pub image_url: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Derived per-request, never stored. `None` for anonymous callers.
    #[sqlx(default)]
    pub is_saved: Option<bool>,
}

/// Event handed to API consumers, location already canonical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: chrono::DateTime<chrono::Utc>,
    pub location: CanonicalLocation,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_saved: Option<bool>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        let location = row.location.normalize();

        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            date: row.date,
            location,
            price: row.price,
            image_url: row.image_url,
            source: row.source,
            source_url: row.source_url,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_saved: row.is_saved,
        }
    }
}
