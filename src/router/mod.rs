//! HTTP API.
pub mod auth;
pub mod events;
pub mod status;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ServerError;

/// Response envelope for successful requests.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` into the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

/// JSON body extractor that runs `validator` checks, collecting every
/// field-level error in one pass.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub fn state(pool: sqlx::Pool<sqlx::Postgres>) -> crate::AppState {
    use std::sync::Arc;

    let config = crate::config::Configuration::default();
    let mut token = crate::token::TokenManager::new(
        "https://events.test",
        "secret-for-tests",
    );
    token.expires_in_days(1);

    let crypto = Arc::new(
        crate::crypto::PasswordManager::new(Some(crate::config::Argon2 {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .expect("cannot build password manager"),
    );

    crate::AppState {
        config: Arc::new(config),
        db: crate::database::Database { postgres: pool },
        crypto,
        token,
    }
}
