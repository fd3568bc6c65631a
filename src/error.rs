use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{db::StoreError, diff::NoChange};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("url does not exist")]
    UrlNotFound,

    #[error("no route for {0}")]
    RouteNotFound(String),

    #[error("update changes nothing")]
    NoChange,

    #[error("url is already shortened under another code")]
    UrlAlreadyExists,

    #[error("could not allocate a unique short code")]
    CodeSpaceExhausted,

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MalformedInput(error) => (
                StatusCode::BAD_REQUEST,
                format!("Error processing request: {error}"),
            ),
            AppError::UrlNotFound | AppError::RouteNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::NoChange | AppError::UrlAlreadyExists => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::CodeSpaceExhausted | AppError::Encoding(_) | AppError::Store(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::UrlNotFound,
            StoreError::Duplicate => AppError::UrlAlreadyExists,
            err => AppError::Store(err),
        }
    }
}

impl From<NoChange> for AppError {
    fn from(_: NoChange) -> Self {
        AppError::NoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        let cases = [
            (AppError::MalformedInput("eof".into()), StatusCode::BAD_REQUEST),
            (AppError::UrlNotFound, StatusCode::NOT_FOUND),
            (AppError::RouteNotFound("/x".into()), StatusCode::NOT_FOUND),
            (AppError::NoChange, StatusCode::CONFLICT),
            (AppError::UrlAlreadyExists, StatusCode::CONFLICT),
            (AppError::CodeSpaceExhausted, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn not_found_message_names_the_url() {
        assert_eq!(AppError::UrlNotFound.to_string(), "url does not exist");
    }

    #[test]
    fn store_duplicate_becomes_conflict() {
        let error = AppError::from(StoreError::Duplicate);
        assert!(matches!(error, AppError::UrlAlreadyExists));
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_not_found_becomes_url_not_found() {
        assert!(matches!(
            AppError::from(StoreError::NotFound),
            AppError::UrlNotFound
        ));
        assert!(matches!(
            AppError::from(StoreError::from(sqlx::Error::RowNotFound)),
            AppError::UrlNotFound
        ));
    }
}
