mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User as saved on database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
