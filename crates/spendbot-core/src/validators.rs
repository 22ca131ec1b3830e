use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{dates::parse_user_date, domain::MAX_DESCRIPTION_LEN};

/// A single form field failed validation; the user is asked again.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Invalid date format! Please, try again, using format [dd.mm.yyyy] or check the date correctness.")]
    Date,

    #[error("Invalid amount! Please enter a valid decimal number.")]
    Amount,

    #[error("Title is too long! Please keep it under {MAX_DESCRIPTION_LEN} characters.")]
    TitleTooLong,

    #[error("Please provide a valid expense ID.")]
    ExpenseId,

    #[error("End date can't be earlier than the start date. Please, enter the end date again.")]
    RangeOrder,
}

pub fn validate_date(input: &str) -> Result<NaiveDate, FieldError> {
    parse_user_date(input).ok_or(FieldError::Date)
}

/// Non-negative decimal, normalized to two fractional digits.
pub fn validate_amount(input: &str) -> Result<Decimal, FieldError> {
    let value = Decimal::from_str(input.trim()).map_err(|_| FieldError::Amount)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(FieldError::Amount);
    }
    Ok(round_money(value))
}

pub fn validate_title(input: &str) -> Result<String, FieldError> {
    let title = input.trim();
    if title.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(FieldError::TitleTooLong);
    }
    Ok(title.to_string())
}

pub fn validate_expense_id(input: &str) -> Result<String, FieldError> {
    let id = input.trim();
    if id.is_empty() {
        return Err(FieldError::ExpenseId);
    }
    Ok(id.to_string())
}

/// Money keeps two fractional digits, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    let mut v =
        value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    v
}
