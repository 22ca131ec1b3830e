use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl UserId {
    /// Owner key stored with every expense record.
    pub fn owner_key(&self) -> String {
        self.0.to_string()
    }
}

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Longest description accepted anywhere in the system.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// One persisted expense, in its wire shape.
///
/// Field names on the wire keep the backend's historical names
/// (`telegram_user_id`, `amount_in_uah`, `amount_in_usd`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(rename = "telegram_user_id")]
    pub owner_id: String,
    #[serde(rename = "amount_in_uah")]
    pub amount_primary: Decimal,
    #[serde(rename = "amount_in_usd")]
    pub amount_secondary: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(with = "crate::dates::display_date")]
    pub expense_date: NaiveDate,
}

/// Body of `POST /expense`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    #[serde(rename = "telegram_user_id")]
    pub owner_id: String,
    #[serde(rename = "amount_in_uah")]
    pub amount_primary: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "crate::dates::wire_date")]
    pub expense_date: NaiveDate,
}

/// Body of `PUT /expense`; only supplied fields are overwritten.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateExpenseRequest {
    pub id: String,
    #[serde(
        rename = "telegram_user_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<String>,
    #[serde(
        rename = "amount_in_uah",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub amount_primary: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::wire_date_opt"
    )]
    pub expense_date: Option<NaiveDate>,
}

impl UpdateExpenseRequest {
    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none()
            && self.amount_primary.is_none()
            && self.description.is_none()
            && self.expense_date.is_none()
    }
}

/// Query string of `GET /expenses`. Dates stay raw (`yyyy-mm-dd`) so the
/// backend can report malformed bounds instead of dropping them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListExpensesQuery {
    #[serde(
        rename = "expense_telegram_user_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Error payload returned by the backend on every non-success status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
