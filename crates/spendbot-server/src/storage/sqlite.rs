use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendbot_core::domain::Expense;
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use tracing::info;

use super::{ExpenseFilter, ExpenseStore};
use crate::error::{ServiceError, ServiceResult};

/// Owns the SQLite pool and the schema.
#[derive(Clone, Debug)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn new(url: &str) -> sqlx::Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database {}", url);
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// A private in-memory database, one per call.
    pub async fn in_memory() -> sqlx::Result<Self> {
        let db_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", db_id);
        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS expenses (
                id TEXT PRIMARY KEY,
                telegram_user_id TEXT NOT NULL,
                amount_in_uah TEXT NOT NULL,
                amount_in_usd TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                expense_date TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_expenses_owner_date \
             ON expenses (telegram_user_id, expense_date)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// `ExpenseStore` over SQLite. Amounts are kept as decimal text so no
/// precision is lost; dates as `yyyy-mm-dd` so they compare as text.
#[derive(Clone, Debug)]
pub struct SqliteExpenseStore {
    db: DbConnection,
}

impl SqliteExpenseStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseStore for SqliteExpenseStore {
    async fn insert(&self, expense: &Expense) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO expenses \
             (id, telegram_user_id, amount_in_uah, amount_in_usd, description, expense_date) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&expense.id)
        .bind(&expense.owner_id)
        .bind(expense.amount_primary.to_string())
        .bind(expense.amount_secondary.to_string())
        .bind(&expense.description)
        .bind(expense.expense_date)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> ServiceResult<Option<Expense>> {
        let row = sqlx::query("SELECT * FROM expenses WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_expense).transpose()
    }

    async fn list(&self, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>> {
        let rows = sqlx::query(
            "SELECT * FROM expenses \
             WHERE (? IS NULL OR telegram_user_id = ?) \
               AND (? IS NULL OR expense_date >= ?) \
               AND (? IS NULL OR expense_date <= ?) \
             ORDER BY expense_date, rowid",
        )
        .bind(&filter.owner_id)
        .bind(&filter.owner_id)
        .bind(filter.start)
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.end)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(row_to_expense).collect()
    }

    async fn replace(&self, expense: &Expense) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE expenses SET telegram_user_id = ?, amount_in_uah = ?, amount_in_usd = ?, \
             description = ?, expense_date = ? WHERE id = ?",
        )
        .bind(&expense.owner_id)
        .bind(expense.amount_primary.to_string())
        .bind(expense.amount_secondary.to_string())
        .bind(&expense.description)
        .bind(expense.expense_date)
        .bind(&expense.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_expense(row: &SqliteRow) -> ServiceResult<Expense> {
    let amount = |col: &str| -> ServiceResult<Decimal> {
        let raw: String = row.try_get(col)?;
        Decimal::from_str(&raw).map_err(|e| ServiceError::Corrupt(format!("{col}={raw:?}: {e}")))
    };
    let expense_date: NaiveDate = row.try_get("expense_date")?;

    Ok(Expense {
        id: row.try_get("id")?,
        owner_id: row.try_get("telegram_user_id")?,
        amount_primary: amount("amount_in_uah")?,
        amount_secondary: amount("amount_in_usd")?,
        description: row.try_get("description")?,
        expense_date,
    })
}
