//! # Expense Tracker Backend
//!
//! HTTP CRUD service over a single `expenses` table.
//!
//! ## Architecture
//!
//! ```text
//! REST layer (axum handlers, boundary error middleware)
//!     ↓
//! Domain layer (field schema, ExpenseService)
//!     ↓
//! Storage layer (DbConnection over SQLite)
//! ```
//!
//! Each request is independent: one validation pass, one SQL statement.
//! The database pool is created once and shared through [`AppState`].

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod rest;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::config::AppConfig;
use crate::db::DbConnection;
use crate::domain::ExpenseService;

/// Request bodies above this size are rejected
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub expense_service: ExpenseService,
}

impl AppState {
    pub fn new(expense_service: ExpenseService) -> Self {
        Self { expense_service }
    }
}

/// Connect to the configured database and build the application state
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database_url).await?;

    info!("Setting up application state");
    Ok(AppState::new(ExpenseService::new(db)))
}

/// Create the Axum router with all routes and layers configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let allow_origin = if config.allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(config.allowed_origin.parse::<HeaderValue>()?)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(
        DefaultMakeSpan::new().include_headers(!config.environment.is_production()),
    );

    let router = Router::new()
        .route("/", get(rest::root))
        .route(
            "/expenses",
            get(rest::list_expenses).post(rest::create_expense),
        )
        .route(
            "/expenses/:expense_id",
            get(rest::get_expense)
                .patch(rest::update_expense)
                .delete(rest::delete_expense),
        )
        .layer(middleware::from_fn_with_state(
            config.environment,
            rest::error_boundary,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(trace)
        .with_state(app_state);

    Ok(router)
}
