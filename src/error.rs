//! Error handler for opendoor.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// PostgreSQL SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("missing or invalid 'Authorization' header")]
    Unauthenticated,

    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(&'static str),

    #[error("storage did not answer in time")]
    Timeout,

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<jsonwebtoken::errors::Error> for ServerError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        // Expired, malformed and badly-signed tokens all look the same to
        // the caller.
        ServerError::Unauthenticated
    }
}

/// Response envelope for failed requests.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    success: bool,
    #[serde(skip)]
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            success: false,
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal server error.".to_owned(),
            errors: None,
        }
    }
}

/// Field-level error detail, one entry per invalid field check.
#[derive(Debug, Serialize)]
pub struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .message(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response
                .message("There were validation errors with your request.")
                .errors(validation_errors),

            ServerError::Json(err) => response.message(&err.body_text()),

            ServerError::Query(err) => response.message(&err.body_text()),

            ServerError::Unauthenticated | ServerError::InvalidCredentials => {
                response.status(StatusCode::UNAUTHORIZED)
            },

            ServerError::Forbidden(_) => {
                response.status(StatusCode::FORBIDDEN)
            },

            ServerError::NotFound { .. } => {
                response.status(StatusCode::NOT_FOUND)
            },

            ServerError::Conflict(_) => response.status(StatusCode::CONFLICT),

            ServerError::Timeout => {
                response.status(StatusCode::GATEWAY_TIMEOUT)
            },

            // Storage error text is never echoed to clients.
            ServerError::Sql(err) => match err {
                SQLxError::RowNotFound => response
                    .message("Resource not found.")
                    .status(StatusCode::NOT_FOUND),
                SQLxError::PoolTimedOut => ResponseError::default()
                    .message("Storage did not answer in time.")
                    .status(StatusCode::GATEWAY_TIMEOUT),
                err if is_unique_violation(err) => response
                    .message("A resource with this value already exists.")
                    .status(StatusCode::CONFLICT),
                err => {
                    tracing::error!(error = %err, "SQL request failed");
                    ResponseError::default()
                },
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "credential hashing failed");

                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");

                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

pub(crate) fn is_unique_violation(err: &SQLxError) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "success": false,
                "message": "Internal server error.",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
