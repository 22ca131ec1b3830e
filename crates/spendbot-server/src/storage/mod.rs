//! Record store boundary.

mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use spendbot_core::domain::Expense;

use crate::error::ServiceResult;

pub use sqlite::{DbConnection, SqliteExpenseStore};

/// Which records a listing should return. `None` means unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub owner_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }
}

/// Persistence for expense records. Each call is one statement.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, expense: &Expense) -> ServiceResult<()>;

    async fn get(&self, id: &str) -> ServiceResult<Option<Expense>>;

    /// Records matching `filter`, ordered by date then insertion.
    async fn list(&self, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>>;

    /// Overwrite every field of an existing record; `false` if it is gone.
    async fn replace(&self, expense: &Expense) -> ServiceResult<bool>;

    async fn delete(&self, id: &str) -> ServiceResult<bool>;
}
