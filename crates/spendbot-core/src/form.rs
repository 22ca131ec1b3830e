//! Conversation forms as an explicit state machine.
//!
//! Every flow is a fixed sequence of prompts. `transition` is pure: it takes
//! the current state and one inbound text and returns the next state plus the
//! effects the runner has to perform. Invalid input returns the same state
//! with an error reply, so the user can retry as often as needed.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    messaging::types::InlineKeyboard,
    validators::{
        validate_amount, validate_date, validate_expense_id, validate_title, FieldError,
    },
};

pub const PROMPT_TITLE: &str = "Enter expense title.";
pub const PROMPT_DATE: &str = "Enter expense date (format: [dd.mm.yyyy])";
pub const PROMPT_AMOUNT: &str = "Enter the sum (in UAH).";
pub const PROMPT_START_DATE: &str = "Enter start date of the period (format: [dd.mm.yyyy]).";
pub const PROMPT_END_DATE: &str = "Enter end date of the period (format: [dd.mm.yyyy]).";
pub const PROMPT_FETCHING: &str = "Fetching your expenses...";
pub const PROMPT_DELETE_ID: &str = "Enter expense_id you want to delete.";
pub const PROMPT_UPDATE_ID: &str = "Enter expense_id you want to update.";
pub const PROMPT_UPDATE_TITLE: &str = "Enter new title (or - to keep the current one).";
pub const PROMPT_UPDATE_DATE: &str =
    "Enter new expense date (format: [dd.mm.yyyy], or - to keep the current one).";
pub const PROMPT_UPDATE_AMOUNT: &str = "Enter new sum in UAH (or - to keep the current one).";
pub const MENU_DONE: &str = "Operation complete. Choose an action:";
pub const MENU_IDLE: &str = "Choose an action:";
pub const MENU_CANCELLED: &str = "Cancelled. Choose an action:";
pub const NOTHING_TO_UPDATE: &str = "Nothing to update.";

/// Answer that keeps a field unchanged in the update flow.
pub const KEEP_MARKER: &str = "-";

/// The menu entries; each starts one flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flow {
    AddExpense,
    UpdateExpense,
    DeleteExpense,
    Report,
}

impl Flow {
    pub const ALL: [Flow; 4] = [
        Flow::AddExpense,
        Flow::UpdateExpense,
        Flow::DeleteExpense,
        Flow::Report,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Flow::AddExpense => "Add Expense",
            Flow::UpdateExpense => "Update Expense",
            Flow::DeleteExpense => "Delete Expense",
            Flow::Report => "Get Report",
        }
    }

    pub fn callback_data(self) -> &'static str {
        match self {
            Flow::AddExpense => "add_expense",
            Flow::UpdateExpense => "edit_expense",
            Flow::DeleteExpense => "delete_expense",
            Flow::Report => "report",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.callback_data() == data)
    }
}

pub fn main_menu() -> InlineKeyboard {
    let options: Vec<(&str, &str)> = Flow::ALL
        .iter()
        .map(|f| (f.label(), f.callback_data()))
        .collect();
    InlineKeyboard::one_per_row(&options)
}

/// Where a user currently is, with everything collected so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,

    AwaitingTitle,
    AwaitingDate {
        title: String,
    },
    AwaitingAmount {
        title: String,
        date: NaiveDate,
    },

    AwaitingStartDate,
    AwaitingEndDate {
        start: NaiveDate,
    },

    AwaitingExpenseId,

    AwaitingUpdateId,
    AwaitingUpdateTitle {
        expense_id: String,
    },
    AwaitingUpdateDate {
        expense_id: String,
        title: Option<String>,
    },
    AwaitingUpdateAmount {
        expense_id: String,
        title: Option<String>,
        date: Option<NaiveDate>,
    },
}

impl FormState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FormState::Idle)
    }
}

/// A completed form, ready to be sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    CreateExpense {
        title: String,
        date: NaiveDate,
        amount: Decimal,
    },
    Report {
        start: NaiveDate,
        end: NaiveDate,
    },
    DeleteExpense {
        expense_id: String,
    },
    UpdateExpense {
        expense_id: String,
        title: Option<String>,
        date: Option<NaiveDate>,
        amount: Option<Decimal>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Send a text message (Telegram HTML).
    Reply(String),
    /// Fetch the user's records and send them as a spreadsheet.
    SendListing,
    Submit(Submission),
    /// Send a message with the main menu attached.
    ShowMenu(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub state: FormState,
    pub effects: Vec<Effect>,
}

impl Step {
    fn ask(state: FormState, prompt: &str) -> Self {
        Self {
            state,
            effects: vec![Effect::Reply(prompt.to_string())],
        }
    }

    fn retry(state: FormState, err: FieldError) -> Self {
        Self {
            state,
            effects: vec![Effect::Reply(err.to_string())],
        }
    }

    fn submit(submission: Submission) -> Self {
        Self {
            state: FormState::Idle,
            effects: vec![
                Effect::Submit(submission),
                Effect::ShowMenu(MENU_DONE.to_string()),
            ],
        }
    }
}

/// Entering a flow from the menu.
pub fn start(flow: Flow) -> Step {
    match flow {
        Flow::AddExpense => Step::ask(FormState::AwaitingTitle, PROMPT_TITLE),
        Flow::Report => Step::ask(FormState::AwaitingStartDate, PROMPT_START_DATE),
        Flow::DeleteExpense => Step {
            state: FormState::AwaitingExpenseId,
            effects: vec![
                Effect::Reply(PROMPT_FETCHING.to_string()),
                Effect::SendListing,
                Effect::Reply(PROMPT_DELETE_ID.to_string()),
            ],
        },
        Flow::UpdateExpense => Step {
            state: FormState::AwaitingUpdateId,
            effects: vec![
                Effect::Reply(PROMPT_FETCHING.to_string()),
                Effect::SendListing,
                Effect::Reply(PROMPT_UPDATE_ID.to_string()),
            ],
        },
    }
}

/// Consume one inbound text in `state`.
pub fn transition(state: FormState, input: &str) -> Step {
    match state {
        FormState::Idle => Step {
            state: FormState::Idle,
            effects: vec![Effect::ShowMenu(MENU_IDLE.to_string())],
        },

        FormState::AwaitingTitle => match validate_title(input) {
            Ok(title) => Step::ask(FormState::AwaitingDate { title }, PROMPT_DATE),
            Err(e) => Step::retry(FormState::AwaitingTitle, e),
        },
        FormState::AwaitingDate { title } => match validate_date(input) {
            Ok(date) => Step::ask(FormState::AwaitingAmount { title, date }, PROMPT_AMOUNT),
            Err(e) => Step::retry(FormState::AwaitingDate { title }, e),
        },
        FormState::AwaitingAmount { title, date } => match validate_amount(input) {
            Ok(amount) => Step::submit(Submission::CreateExpense {
                title,
                date,
                amount,
            }),
            Err(e) => Step::retry(FormState::AwaitingAmount { title, date }, e),
        },

        FormState::AwaitingStartDate => match validate_date(input) {
            Ok(start) => Step::ask(FormState::AwaitingEndDate { start }, PROMPT_END_DATE),
            Err(e) => Step::retry(FormState::AwaitingStartDate, e),
        },
        FormState::AwaitingEndDate { start } => match validate_date(input) {
            Ok(end) if end < start => {
                Step::retry(FormState::AwaitingEndDate { start }, FieldError::RangeOrder)
            }
            Ok(end) => Step::submit(Submission::Report { start, end }),
            Err(e) => Step::retry(FormState::AwaitingEndDate { start }, e),
        },

        FormState::AwaitingExpenseId => match validate_expense_id(input) {
            Ok(expense_id) => Step::submit(Submission::DeleteExpense { expense_id }),
            Err(e) => Step::retry(FormState::AwaitingExpenseId, e),
        },

        FormState::AwaitingUpdateId => match validate_expense_id(input) {
            Ok(expense_id) => Step::ask(
                FormState::AwaitingUpdateTitle { expense_id },
                PROMPT_UPDATE_TITLE,
            ),
            Err(e) => Step::retry(FormState::AwaitingUpdateId, e),
        },
        FormState::AwaitingUpdateTitle { expense_id } => {
            match keep_or(input, validate_title) {
                Ok(title) => Step::ask(
                    FormState::AwaitingUpdateDate { expense_id, title },
                    PROMPT_UPDATE_DATE,
                ),
                Err(e) => Step::retry(FormState::AwaitingUpdateTitle { expense_id }, e),
            }
        }
        FormState::AwaitingUpdateDate { expense_id, title } => {
            match keep_or(input, validate_date) {
                Ok(date) => Step::ask(
                    FormState::AwaitingUpdateAmount {
                        expense_id,
                        title,
                        date,
                    },
                    PROMPT_UPDATE_AMOUNT,
                ),
                Err(e) => Step::retry(FormState::AwaitingUpdateDate { expense_id, title }, e),
            }
        }
        FormState::AwaitingUpdateAmount {
            expense_id,
            title,
            date,
        } => match keep_or(input, validate_amount) {
            Ok(None) if title.is_none() && date.is_none() => Step {
                state: FormState::Idle,
                effects: vec![
                    Effect::Reply(NOTHING_TO_UPDATE.to_string()),
                    Effect::ShowMenu(MENU_DONE.to_string()),
                ],
            },
            Ok(amount) => Step::submit(Submission::UpdateExpense {
                expense_id,
                title,
                date,
                amount,
            }),
            Err(e) => Step::retry(
                FormState::AwaitingUpdateAmount {
                    expense_id,
                    title,
                    date,
                },
                e,
            ),
        },
    }
}

/// Leaving whatever flow is active.
pub fn cancel() -> Step {
    Step {
        state: FormState::Idle,
        effects: vec![Effect::ShowMenu(MENU_CANCELLED.to_string())],
    }
}

fn keep_or<T>(
    input: &str,
    validate: impl FnOnce(&str) -> Result<T, FieldError>,
) -> Result<Option<T>, FieldError> {
    if input.trim() == KEEP_MARKER {
        return Ok(None);
    }
    validate(input).map(Some)
}
