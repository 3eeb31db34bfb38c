//! Manage identity tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

const DEFAULT_AUDIENCE: &str = "events.opendoor.app";
/// Default token lifetime. Kept short, tokens are not revocable.
const DEFAULT_EXPIRES_IN_DAYS: u64 = 7;
const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// Pieces of information asserted on an identity token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the token is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the token must not
    /// be accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the token was issued.
    pub iat: u64,
    /// Identifies the instance that issued the token.
    pub iss: String,
    /// User ID.
    pub sub: String,
}

/// Manage signed identity tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    name: String,
    audience: String,
    expires_in: u64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(name: &str, secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expires_in: DEFAULT_EXPIRES_IN_DAYS * SECONDS_PER_DAY,
        }
    }

    /// Set `audience` field on tokens.
    pub fn audience(&mut self, audience: &str) {
        self.audience = audience.to_owned();
    }

    /// Set token lifetime in days.
    pub fn expires_in_days(&mut self, days: u64) {
        self.expires_in = days * SECONDS_PER_DAY;
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Create a new signed token for a user.
    pub fn create(&self, user_id: Uuid) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: time + self.expires_in,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_string(),
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Decode and check a token, returning the acting user.
    pub fn decode(&self, token: &str) -> Result<Uuid> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);

        let claims =
            decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        Uuid::parse_str(&claims.sub)
            .map_err(|_| crate::error::ServerError::Unauthenticated)
    }
}
