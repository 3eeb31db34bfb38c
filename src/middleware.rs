//! Middlewares for routes.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::AppState;
use crate::error::{Result, ServerError};

const BEARER: &str = "Bearer ";

/// Request-scoped acting identity, inserted by the auth middlewares.
/// There is no process-wide notion of "the current user".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity(pub Uuid);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(ServerError::Unauthenticated)
    }
}

/// Identity for routes where anonymous access is fine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self> {
        Ok(Self(parts.extensions.get::<Identity>().copied()))
    }
}

fn bearer_identity(
    state: &AppState,
    req: &Request,
) -> Result<Option<Identity>> {
    let Some(header) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    else {
        return Ok(None);
    };

    let token = header.strip_prefix(BEARER).unwrap_or(header);
    let user_id = state.token.decode(token)?;

    Ok(Some(Identity(user_id)))
}

/// Middleware for routes that mutate: a valid, non-expired token is
/// required, and its subject becomes the acting identity.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    match bearer_identity(&state, &req)? {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        },
        None => Err(ServerError::Unauthenticated),
    }
}

/// Middleware for public reads: a token is decoded when present so that
/// responses can carry per-user derived state, but anonymous callers pass
/// through untouched. An invalid token is still rejected rather than
/// silently treated as anonymous.
pub async fn identify(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    if let Some(identity) = bearer_identity(&state, &req)? {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}
