use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spendbot_core::domain::{
    CreateExpenseRequest, DeleteResponse, ListExpensesQuery, UpdateExpenseRequest,
};
use tracing::info;

use crate::{error::ServiceError, AppState};

/// Axum handler function for POST /expense
pub async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> Response {
    info!("POST /expense - request: {:?}", request);

    match state.expense_service.create(request).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Axum handler function for GET /expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ListExpensesQuery>,
) -> Response {
    info!("GET /expenses - query: {:?}", query);

    match state.expense_service.list(&query).await {
        Ok(expenses) => (StatusCode::OK, Json(expenses)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Axum handler function for GET /expense/:expense_id
pub async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
) -> Response {
    info!("GET /expense/{}", expense_id);

    match state.expense_service.get(&expense_id).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Axum handler function for PUT /expense
pub async fn update_expense(
    State(state): State<AppState>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Response {
    info!("PUT /expense - request: {:?}", request);

    match state.expense_service.update(request).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Axum handler function for DELETE /expense/:expense_id
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
) -> Response {
    info!("DELETE /expense/{}", expense_id);

    match state.expense_service.delete(&expense_id).await {
        Ok(true) => {
            let body = DeleteResponse {
                message: format!("[{expense_id}] was deleted"),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(false) => ServiceError::NotFound(expense_id).into_response(),
        Err(e) => e.into_response(),
    }
}
