//! Error taxonomy for the expense service and its HTTP mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Expense doesn't exist";

#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Missing or malformed client input
    #[error("{0}")]
    Validation(String),

    /// Body the extractor refused before it could be read, e.g. over the
    /// size limit. Keeps the rejection's own status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

impl From<JsonRejection> for ExpenseError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(_) => ExpenseError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            },
            _ => ExpenseError::Validation(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ExpenseError {
    fn from(rejection: PathRejection) -> Self {
        ExpenseError::Validation(format!("Invalid expense id: {}", rejection.body_text()))
    }
}

/// Detail of a failed store operation, attached to the 500 response so the
/// boundary middleware can decide how much of it to expose.
#[derive(Debug, Clone)]
pub struct StoreFailure {
    pub message: String,
    pub details: String,
}

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        match self {
            ExpenseError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
            ExpenseError::Rejected { status, message } => {
                (status, Json(ErrorResponse::new(message))).into_response()
            }
            ExpenseError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(NOT_FOUND_MESSAGE)),
            )
                .into_response(),
            ExpenseError::Store(error) => {
                let failure = StoreFailure {
                    message: error.to_string(),
                    details: format!("{error:?}"),
                };
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("server error")),
                )
                    .into_response();
                response.extensions_mut().insert(failure);
                response
            }
        }
    }
}
