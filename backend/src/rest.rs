//! # REST API for Expenses
//!
//! Handlers for `/expenses` and `/expenses/:expense_id`, plus the boundary
//! middleware that shapes every 500 response.
//!
//! Handlers return `Result<_, ExpenseError>`; validation and not-found
//! errors become 400/404 bodies directly, store failures are finished by
//! [`error_boundary`].

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Request, State,
    },
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use shared::{ErrorResponse, Expense, ExpenseFields};
use tracing::{error, info};

use crate::config::Environment;
use crate::error::{ExpenseError, StoreFailure};
use crate::AppState;

pub async fn root() -> &'static str {
    "Hello, expenses!"
}

/// GET /expenses
pub async fn list_expenses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    info!("GET /expenses");

    let expenses = state.expense_service.list_expenses().await?;
    Ok(Json(expenses))
}

/// GET /expenses/:expense_id
pub async fn get_expense(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Expense>, ExpenseError> {
    let Path(expense_id) = path?;
    info!("GET /expenses/{}", expense_id);

    let expense = state.expense_service.get_expense(expense_id).await?;
    Ok(Json(expense))
}

/// POST /expenses
pub async fn create_expense(
    State(state): State<AppState>,
    body: Result<Json<ExpenseFields>, JsonRejection>,
) -> Result<impl IntoResponse, ExpenseError> {
    let Json(fields) = body?;
    info!("POST /expenses - request: {:?}", fields);

    let expense = state.expense_service.create_expense(&fields).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, expense.location())],
        Json(expense),
    ))
}

/// PATCH /expenses/:expense_id
///
/// The target must exist before the body is looked at, so a missing
/// expense is a 404 even when the body is empty or malformed.
pub async fn update_expense(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ExpenseFields>, JsonRejection>,
) -> Result<StatusCode, ExpenseError> {
    let Path(expense_id) = path?;
    info!("PATCH /expenses/{}", expense_id);

    state.expense_service.get_expense(expense_id).await?;
    let Json(fields) = body?;
    state
        .expense_service
        .update_expense(expense_id, &fields)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /expenses/:expense_id
pub async fn delete_expense(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ExpenseError> {
    let Path(expense_id) = path?;
    info!("DELETE /expenses/{}", expense_id);

    state.expense_service.delete_expense(expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Turns store failures into the final 500 body. Production gets a generic
/// message; other environments get the error text and debug detail.
pub async fn error_boundary(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(failure) = response.extensions_mut().remove::<StoreFailure>() else {
        return response;
    };

    if environment.is_production() {
        error!("Store failure: {}", failure.message);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("server error")),
        )
            .into_response();
    }

    error!(details = %failure.details, "Store failure: {}", failure.message);
    let body = json!({
        "message": failure.message,
        "error": {
            "message": failure.message,
            "details": failure.details,
        },
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
