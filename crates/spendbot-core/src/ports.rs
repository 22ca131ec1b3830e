use async_trait::async_trait;

use crate::{
    domain::{CreateExpenseRequest, Expense, ListExpensesQuery, UpdateExpenseRequest},
    Result,
};

/// Backend boundary as seen from the bot.
///
/// Implemented over HTTP by `spendbot-client`; every call is a single request,
/// failures come back as `Error::Network` or `Error::Status`.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    async fn create_expense(&self, req: &CreateExpenseRequest) -> Result<Expense>;

    async fn list_expenses(&self, query: &ListExpensesQuery) -> Result<Vec<Expense>>;

    async fn update_expense(&self, req: &UpdateExpenseRequest) -> Result<Expense>;

    /// Returns the backend's confirmation message.
    async fn delete_expense(&self, expense_id: &str) -> Result<String>;
}

/// Why a rate lookup produced no value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("Failed to fetch currency data: {0}")]
    Transport(String),

    #[error("Failed to fetch currency data: status {0}")]
    Status(u16),

    #[error("Could not find USD to local currency exchange rate.")]
    NotFound,

    #[error("Exchange rate cell is not a number: {0:?}")]
    Parse(String),
}

/// Best-effort oracle for the USD → local currency rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn usd_to_local(&self) -> std::result::Result<f64, RateError>;
}
