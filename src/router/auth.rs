//! Registration and login routes.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError, is_unique_violation};
use crate::router::{Success, Valid, success};
use crate::user::{User, UserRepository};

pub const TOKEN_TYPE: &str = "Bearer";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Please tell us your name."
    ))]
    pub name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Handler to create an account.
pub async fn register(
    State(state): State<AppState>,
    Valid(body): Valid<RegisterBody>,
) -> Result<(StatusCode, Json<Success<AuthData>>)> {
    let repo = UserRepository::new(state.db.postgres.clone());

    // Emails are unique case-insensitively.
    let email = body.email.to_lowercase();
    let password_phc = state.crypto.hash_password(&body.password)?;

    let user = repo
        .insert(body.name.trim(), &email, &password_phc)
        .await
        .map_err(|err| match err {
            ServerError::Sql(sql) if is_unique_violation(&sql) => {
                ServerError::Conflict(
                    "an account with this email already exists",
                )
            },
            err => err,
        })?;

    let token = state.token.create(user.id)?;

    Ok((
        StatusCode::CREATED,
        success(AuthData {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in: state.token.expires_in(),
            user,
        }),
    ))
}

/// Handler to verify a credential and issue a token.
///
/// Unknown email and wrong password answer with one generic message so the
/// endpoint cannot be used to probe which addresses have accounts.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Success<AuthData>>> {
    let repo = UserRepository::new(state.db.postgres.clone());

    let user = repo
        .find_by_email(&body.email.to_lowercase())
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    if !state.crypto.verify_password(&body.password, &user.password) {
        return Err(ServerError::InvalidCredentials);
    }

    let token = state.token.create(user.id)?;

    Ok(success(AuthData {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        expires_in: state.token.expires_in(),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::{app, make_request, router};

    #[sqlx::test]
    async fn test_register_then_login(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let body = json!({
            "name": "Ada",
            "email": "Ada@Campus.Edu",
            "password": "correct-horse-battery",
        });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/register",
            None,
            body.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Success<AuthData> = serde_json::from_slice(&body).unwrap();
        assert!(body.success);
        assert_eq!(body.data.token_type, TOKEN_TYPE);
        // Emails are lowercased at the boundary, passwords never echoed.
        assert_eq!(body.data.user.email, "ada@campus.edu");
        assert_eq!(body.data.user.password, "");
        assert_eq!(
            state.token.decode(&body.data.token).unwrap(),
            body.data.user.id
        );

        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({
                "email": "ADA@campus.edu",
                "password": "correct-horse-battery",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_register_duplicate_email_conflicts(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let body = json!({
            "name": "Ada",
            "email": "ada@campus.edu",
            "password": "correct-horse-battery",
        });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/register",
            None,
            body.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            app,
            Method::POST,
            "/auth/register",
            None,
            body.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_register_with_short_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app,
            Method::POST,
            "/auth/register",
            None,
            json!({
                "name": "Ada",
                "email": "ada@campus.edu",
                "password": "short",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_login_with_wrong_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/register",
            None,
            json!({
                "name": "Ada",
                "email": "ada@campus.edu",
                "password": "correct-horse-battery",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({
                "email": "ada@campus.edu",
                "password": "wrong-password",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
