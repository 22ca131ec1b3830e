//! Expense use-cases: validation, currency conversion, persistence.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendbot_core::{
    dates::parse_wire_date,
    domain::{
        CreateExpenseRequest, Expense, ListExpensesQuery, UpdateExpenseRequest,
        MAX_DESCRIPTION_LEN,
    },
    ports::RateSource,
    validators::round_money,
};
use tracing::{debug, info, warn};

use crate::{
    error::{ServiceError, ServiceResult},
    storage::{ExpenseFilter, ExpenseStore},
};

#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
    rates: Arc<dyn RateSource>,
    fallback_rate: Decimal,
}

impl ExpenseService {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        rates: Arc<dyn RateSource>,
        fallback_rate: Decimal,
    ) -> Self {
        Self {
            store,
            rates,
            fallback_rate,
        }
    }

    pub async fn create(&self, req: CreateExpenseRequest) -> ServiceResult<Expense> {
        let amount_primary = validate_amount(req.amount_primary)?;
        let description = validate_description(req.description.unwrap_or_default())?;
        let rate = self.current_rate().await;

        let expense = Expense {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: req.owner_id,
            amount_primary,
            amount_secondary: convert(amount_primary, rate)?,
            description,
            expense_date: req.expense_date,
        };
        self.store.insert(&expense).await?;
        info!(id = %expense.id, owner = %expense.owner_id, %rate, "expense created");
        Ok(expense)
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Expense>> {
        self.store.list(&ExpenseFilter::all()).await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> ServiceResult<Vec<Expense>> {
        self.store.list(&ExpenseFilter::owner(owner_id)).await
    }

    /// Inclusive on both ends; a missing bound is unbounded. Bounds are
    /// `yyyy-mm-dd` strings and a malformed one is a `Parse` error.
    pub async fn list_by_owner_in_range(
        &self,
        owner_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ServiceResult<Vec<Expense>> {
        let filter = ExpenseFilter {
            owner_id: Some(owner_id.to_string()),
            start: parse_bound("start_date", start_date)?,
            end: parse_bound("end_date", end_date)?,
        };
        self.store.list(&filter).await
    }

    /// Dispatch for `GET /expenses`. Bounds are parsed even without an
    /// owner, so a listing never silently drops a filter.
    pub async fn list(&self, query: &ListExpensesQuery) -> ServiceResult<Vec<Expense>> {
        let start = parse_bound("start_date", query.start_date.as_deref())?;
        let end = parse_bound("end_date", query.end_date.as_deref())?;
        match (&query.owner_id, start, end) {
            (None, None, None) => self.list_all().await,
            (Some(owner), None, None) => self.list_by_owner(owner).await,
            (owner_id, start, end) => {
                let filter = ExpenseFilter {
                    owner_id: owner_id.clone(),
                    start,
                    end,
                };
                self.store.list(&filter).await
            }
        }
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Expense> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Overwrites only the supplied fields. The secondary amount is
    /// recomputed only when a new primary amount is supplied.
    pub async fn update(&self, req: UpdateExpenseRequest) -> ServiceResult<Expense> {
        let mut expense = self.get(&req.id).await?;

        if let Some(owner_id) = req.owner_id {
            if owner_id != expense.owner_id {
                return Err(ServiceError::Validation(
                    "telegram_user_id cannot be changed".to_string(),
                ));
            }
        }
        if let Some(description) = req.description {
            expense.description = validate_description(description)?;
        }
        if let Some(date) = req.expense_date {
            expense.expense_date = date;
        }
        if let Some(amount) = req.amount_primary {
            let amount = validate_amount(amount)?;
            let rate = self.current_rate().await;
            expense.amount_secondary = convert(amount, rate)?;
            expense.amount_primary = amount;
        }

        if !self.store.replace(&expense).await? {
            return Err(ServiceError::NotFound(expense.id));
        }
        info!(id = %expense.id, "expense updated");
        Ok(expense)
    }

    /// `false` when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let deleted = self.store.delete(id).await?;
        debug!(id, deleted, "delete expense");
        Ok(deleted)
    }

    /// Live rate, or the configured fallback when the lookup fails.
    pub async fn current_rate(&self) -> Decimal {
        match self.rates.usd_to_local().await {
            Ok(rate) => match Decimal::try_from(rate) {
                Ok(d) if d > Decimal::ZERO => return d,
                _ => warn!(rate, "exchange rate is not a positive number"),
            },
            Err(e) => warn!(error = %e, "exchange rate lookup failed"),
        }
        warn!(fallback = %self.fallback_rate, "using fallback exchange rate");
        self.fallback_rate
    }
}

fn convert(amount_primary: Decimal, rate: Decimal) -> ServiceResult<Decimal> {
    amount_primary
        .checked_div(rate)
        .map(round_money)
        .ok_or_else(|| {
            ServiceError::Validation(format!(
                "amount_in_uah {amount_primary} is too large to convert at rate {rate}"
            ))
        })
}

fn validate_amount(amount: Decimal) -> ServiceResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ServiceError::Validation(
            "amount_in_uah must not be negative".to_string(),
        ));
    }
    Ok(round_money(amount))
}

fn validate_description(description: String) -> ServiceResult<String> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description)
}

fn parse_bound(name: &str, raw: Option<&str>) -> ServiceResult<Option<NaiveDate>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            parse_wire_date(s).map_err(|e| {
                ServiceError::Parse(format!("{name} must be yyyy-mm-dd, got {s:?}: {e}"))
            })
        })
        .transpose()
}
