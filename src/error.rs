use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::constants::{ERR_INTERNAL, ERR_INVALID_ID, ERR_UNAUTHORIZED};
use crate::transaction::TransactionError;

/// Every failure a handler can report.
///
/// Validation, lookup and uniqueness failures are all answered with 400 and a
/// typed `{"error": {"type", "message"}}` body, where `type` names the
/// offending field. Internal failures are logged and replaced by a generic
/// message so storage details never leak to the caller.
#[derive(Debug)]
pub enum AppError {
    Validation { field: String, message: String },
    NotFound { field: String, message: String },
    Conflict { field: String, message: String },
    Unauthorized,
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::NotFound {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        AppError::Internal(context.into())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation { field, message }
            | AppError::NotFound { field, message }
            | AppError::Conflict { field, message } => write!(f, "{}: {}", field, message),
            AppError::Unauthorized => f.write_str(ERR_UNAUTHORIZED),
            AppError::Internal(context) => write!(f, "internal error: {}", context),
        }
    }
}

impl std::error::Error for AppError {}

impl From<libsql::Error> for AppError {
    fn from(e: libsql::Error) -> Self {
        AppError::Internal(format!("database error: {}", e))
    }
}

impl From<TransactionError> for AppError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::Begin => AppError::internal("failed to begin transaction"),
            TransactionError::Commit => AppError::internal("failed to commit transaction"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { field, message }
            | AppError::NotFound { field, message }
            | AppError::Conflict { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "type": field, "message": message } })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": ERR_UNAUTHORIZED })),
            )
                .into_response(),
            AppError::Internal(context) => {
                tracing::error!(%context, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": ERR_INTERNAL })),
                )
                    .into_response()
            }
        }
    }
}

/// `Json` extractor whose rejection is reported as a typed validation error.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(json_rejection_error(rejection)),
        }
    }
}

fn json_rejection_error(rejection: JsonRejection) -> AppError {
    AppError::validation("body", rejection.body_text())
}

/// `Query` extractor whose rejection is reported as a typed validation error.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidQuery(value)),
            Err(rejection) => Err(AppError::validation("query", rejection.body_text())),
        }
    }
}

/// `Path` extractor for numeric ids; an id that does not parse is reported
/// under the `id` error type like any other missing entity.
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ValidPath(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected path parameter");
                Err(AppError::validation("id", ERR_INVALID_ID))
            }
        }
    }
}
