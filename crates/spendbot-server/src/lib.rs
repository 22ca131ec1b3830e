//! Expense backend: SQLite-backed record store behind a small JSON API.

pub mod error;
pub mod rest;
pub mod service;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::{ServiceError, ServiceResult};
pub use service::ExpenseService;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub expense_service: ExpenseService,
}

impl AppState {
    pub fn new(expense_service: ExpenseService) -> Self {
        Self { expense_service }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/expense",
            post(rest::create_expense).put(rest::update_expense),
        )
        .route("/expenses", get(rest::list_expenses))
        .route(
            "/expense/:expense_id",
            get(rest::get_expense).delete(rest::delete_expense),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
