//! Executes form effects against the messenger and the backend.

use std::{path::PathBuf, sync::Arc};

use tracing::{info, warn};

use crate::{
    dates::{to_display, to_wire},
    domain::{
        ChatId, CreateExpenseRequest, Expense, ListExpensesQuery, UpdateExpenseRequest, UserId,
    },
    errors::Error,
    form::{self, main_menu, Effect, Flow, Submission},
    formatting::{code, escape_html},
    messaging::port::MessagingPort,
    ports::ExpenseApi,
    report::{expenses_to_rows, render_report},
    sessions::FormSessions,
    utils::truncate_text,
    Result,
};

pub const REPORT_CAPTION: &str = "Here is generated report.";

/// Who a message came from and where to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowContext {
    pub user_id: UserId,
    pub chat_id: ChatId,
}

/// Drives the per-user forms: looks up state, applies the transition and then
/// performs whatever the transition asked for.
///
/// Submissions are attempted once. The form is already back to idle before
/// the backend is called, so a failed call only produces a message.
pub struct FlowRunner {
    sessions: FormSessions,
    api: Arc<dyn ExpenseApi>,
    messenger: Arc<dyn MessagingPort>,
    reports_dir: PathBuf,
}

impl FlowRunner {
    pub fn new(
        api: Arc<dyn ExpenseApi>,
        messenger: Arc<dyn MessagingPort>,
        reports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions: FormSessions::new(),
            api,
            messenger,
            reports_dir: reports_dir.into(),
        }
    }

    pub fn sessions(&self) -> &FormSessions {
        &self.sessions
    }

    pub async fn begin(&self, ctx: FlowContext, flow: Flow) -> Result<()> {
        info!(user = ctx.user_id.0, ?flow, "flow started");
        let step = self.sessions.begin(ctx.user_id, flow).await;
        self.run_effects(ctx, step.effects).await
    }

    /// Returns `false` when the user has no active flow.
    pub async fn handle_text(&self, ctx: FlowContext, text: &str) -> Result<bool> {
        let Some(step) = self.sessions.advance(ctx.user_id, text).await else {
            return Ok(false);
        };
        self.run_effects(ctx, step.effects).await?;
        Ok(true)
    }

    pub async fn cancel(&self, ctx: FlowContext) -> Result<bool> {
        let was_active = self.sessions.clear(ctx.user_id).await;
        self.run_effects(ctx, form::cancel().effects).await?;
        Ok(was_active)
    }

    pub async fn show_menu(&self, ctx: FlowContext, text: &str) -> Result<()> {
        self.messenger
            .send_inline_keyboard(ctx.chat_id, text, main_menu())
            .await?;
        Ok(())
    }

    async fn run_effects(&self, ctx: FlowContext, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::Reply(html) => self.say(ctx, &html).await?,
                Effect::ShowMenu(text) => self.show_menu(ctx, &text).await?,
                Effect::SendListing => self.send_listing(ctx).await?,
                Effect::Submit(submission) => self.submit(ctx, submission).await?,
            }
        }
        Ok(())
    }

    async fn say(&self, ctx: FlowContext, html: &str) -> Result<()> {
        let limit = self.messenger.capabilities().max_message_len;
        self.messenger
            .send_html(ctx.chat_id, &truncate_text(html, limit))
            .await?;
        Ok(())
    }

    async fn submit(&self, ctx: FlowContext, submission: Submission) -> Result<()> {
        let reply = match submission {
            Submission::CreateExpense {
                title,
                date,
                amount,
            } => self.create(ctx, title, date, amount).await,
            Submission::Report { start, end } => {
                return self.send_report(ctx, start, end).await;
            }
            Submission::DeleteExpense { expense_id } => self.delete(&expense_id).await,
            Submission::UpdateExpense {
                expense_id,
                title,
                date,
                amount,
            } => {
                let req = UpdateExpenseRequest {
                    id: expense_id,
                    owner_id: None,
                    amount_primary: amount,
                    description: title,
                    expense_date: date,
                };
                self.update(&req).await
            }
        };
        self.say(ctx, &reply).await
    }

    async fn create(
        &self,
        ctx: FlowContext,
        title: String,
        date: chrono::NaiveDate,
        amount: rust_decimal::Decimal,
    ) -> String {
        let req = CreateExpenseRequest {
            owner_id: ctx.user_id.owner_key(),
            amount_primary: amount,
            description: Some(title).filter(|t| !t.is_empty()),
            expense_date: date,
        };
        match self.api.create_expense(&req).await {
            Ok(expense) => {
                info!(user = ctx.user_id.0, id = %expense.id, "expense created");
                "Expense added successfully!".to_string()
            }
            Err(e) => failure_message(&e, "add expense", "sending the expense data"),
        }
    }

    async fn delete(&self, expense_id: &str) -> String {
        match self.api.delete_expense(expense_id).await {
            Ok(_) => format!(
                "Expense with ID {} has been successfully deleted.",
                code(expense_id)
            ),
            Err(e) if e.is_not_found() => not_found_message(expense_id),
            Err(e) => failure_message(&e, "delete expense", "deleting the expense"),
        }
    }

    async fn update(&self, req: &UpdateExpenseRequest) -> String {
        match self.api.update_expense(req).await {
            Ok(expense) => format!("Expense updated.\n{}", describe_expense(&expense)),
            Err(e) if e.is_not_found() => not_found_message(&req.id),
            Err(e) => failure_message(&e, "update expense", "updating the expense"),
        }
    }

    async fn send_report(
        &self,
        ctx: FlowContext,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<()> {
        let start = to_wire(start);
        let end = to_wire(end);
        let query = ListExpensesQuery {
            owner_id: Some(ctx.user_id.owner_key()),
            start_date: Some(start.clone()),
            end_date: Some(end.clone()),
        };

        let expenses = match self.api.list_expenses(&query).await {
            Ok(v) => v,
            Err(e) => {
                let msg = failure_message(&e, "retrieve expenses", "processing the request");
                return self.say(ctx, &msg).await;
            }
        };
        if expenses.is_empty() {
            return self
                .say(ctx, "No expenses found for the specified date range.")
                .await;
        }

        match self.render_for(ctx, &expenses, Some(&start), Some(&end)).await {
            Ok(path) => {
                self.messenger
                    .send_document(ctx.chat_id, &path, Some(REPORT_CAPTION))
                    .await?;
                Ok(())
            }
            Err(e) => {
                let msg = failure_message(&e, "retrieve expenses", "processing the request");
                self.say(ctx, &msg).await
            }
        }
    }

    /// Reference listing shown before asking which record to change.
    async fn send_listing(&self, ctx: FlowContext) -> Result<()> {
        let query = ListExpensesQuery {
            owner_id: Some(ctx.user_id.owner_key()),
            ..Default::default()
        };

        let expenses = match self.api.list_expenses(&query).await {
            Ok(v) => v,
            Err(e) => {
                let msg = failure_message(&e, "fetch your expenses", "fetching your expenses");
                return self.say(ctx, &msg).await;
            }
        };
        if expenses.is_empty() {
            return self.say(ctx, "You don't have any expenses.").await;
        }

        match self.render_for(ctx, &expenses, None, None).await {
            Ok(path) => {
                self.messenger
                    .send_document(ctx.chat_id, &path, Some(REPORT_CAPTION))
                    .await?;
                Ok(())
            }
            Err(e) => {
                let msg = failure_message(&e, "fetch your expenses", "fetching your expenses");
                self.say(ctx, &msg).await
            }
        }
    }

    async fn render_for(
        &self,
        ctx: FlowContext,
        expenses: &[Expense],
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<PathBuf> {
        let dir = self.reports_dir.join(ctx.user_id.owner_key());
        tokio::fs::create_dir_all(&dir).await?;
        let rows = expenses_to_rows(expenses)?;
        render_report(&rows, &dir, start, end)
    }
}

fn not_found_message(expense_id: &str) -> String {
    format!("Expense with ID {} was not found.", code(expense_id))
}

/// Backend statuses and transport errors read differently to the user.
fn failure_message(err: &Error, action: &str, activity: &str) -> String {
    match err {
        Error::Status { status, .. } => format!("Failed to {action}. Error: {status}"),
        other => {
            warn!(error = %other, "{activity} failed");
            format!(
                "An error occurred while {activity}: {}",
                escape_html(&other.to_string())
            )
        }
    }
}

fn describe_expense(e: &Expense) -> String {
    let title = if e.description.is_empty() {
        "(no title)".to_string()
    } else {
        escape_html(&e.description)
    };
    format!(
        "{} · {} · {} UAH ({} USD)\nID: {}",
        title,
        to_display(e.expense_date),
        e.amount_primary,
        e.amount_secondary,
        code(&e.id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageId, MessageRef},
        form::{FormState, MENU_DONE, PROMPT_DELETE_ID, PROMPT_FETCHING},
        messaging::types::{InlineKeyboard, MessagingCapabilities},
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    enum Sent {
        Html(String),
        Menu(String),
        Document(PathBuf, Option<String>),
    }

    #[derive(Default)]
    struct FakeMessenger {
        sent: Mutex<Vec<Sent>>,
    }

    impl FakeMessenger {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn texts(&self) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Html(t) => Some(t),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, s: Sent, chat_id: ChatId) -> MessageRef {
            let mut sent = self.sent.lock().unwrap();
            sent.push(s);
            MessageRef {
                chat_id,
                message_id: MessageId(sent.len() as i32),
            }
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                max_message_len: 4096,
            }
        }

        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            Ok(self.push(Sent::Html(html.to_string()), chat_id))
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            _keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            Ok(self.push(Sent::Menu(text.to_string()), chat_id))
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            path: &Path,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            Ok(self.push(
                Sent::Document(path.to_path_buf(), caption.map(str::to_string)),
                chat_id,
            ))
        }

        async fn answer_callback_query(&self, _id: &str, _text: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Mode {
        Ok,
        NotFound,
        Status500,
        Down,
    }

    struct FakeApi {
        mode: Mutex<Mode>,
        stored: Mutex<Vec<Expense>>,
        creates: Mutex<Vec<CreateExpenseRequest>>,
        updates: Mutex<Vec<UpdateExpenseRequest>>,
        queries: Mutex<Vec<ListExpensesQuery>>,
        deletes: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn new(mode: Mode) -> Self {
            Self {
                mode: Mutex::new(mode),
                stored: Mutex::new(Vec::new()),
                creates: Mutex::new(Vec::new()),
                updates: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
                deletes: Mutex::new(Vec::new()),
            }
        }

        fn with_expenses(self, expenses: Vec<Expense>) -> Self {
            *self.stored.lock().unwrap() = expenses;
            self
        }

        fn check(&self) -> Result<()> {
            match *self.mode.lock().unwrap() {
                Mode::Ok => Ok(()),
                Mode::NotFound => Err(Error::Status {
                    status: 404,
                    detail: Some("missing".to_string()),
                }),
                Mode::Status500 => Err(Error::Status {
                    status: 500,
                    detail: None,
                }),
                Mode::Down => Err(Error::Network("connection refused".to_string())),
            }
        }
    }

    #[async_trait]
    impl ExpenseApi for FakeApi {
        async fn create_expense(&self, req: &CreateExpenseRequest) -> Result<Expense> {
            self.creates.lock().unwrap().push(req.clone());
            self.check()?;
            Ok(Expense {
                id: "new-id".to_string(),
                owner_id: req.owner_id.clone(),
                amount_primary: req.amount_primary,
                amount_secondary: Decimal::new(243, 2),
                description: req.description.clone().unwrap_or_default(),
                expense_date: req.expense_date,
            })
        }

        async fn list_expenses(&self, query: &ListExpensesQuery) -> Result<Vec<Expense>> {
            self.queries.lock().unwrap().push(query.clone());
            self.check()?;
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn update_expense(&self, req: &UpdateExpenseRequest) -> Result<Expense> {
            self.updates.lock().unwrap().push(req.clone());
            self.check()?;
            let mut e = sample_expense();
            e.id = req.id.clone();
            if let Some(d) = &req.description {
                e.description = d.clone();
            }
            Ok(e)
        }

        async fn delete_expense(&self, expense_id: &str) -> Result<String> {
            self.deletes.lock().unwrap().push(expense_id.to_string());
            self.check()?;
            Ok(format!("[{expense_id}] was deleted"))
        }
    }

    fn sample_expense() -> Expense {
        Expense {
            id: "e-1".to_string(),
            owner_id: "10".to_string(),
            amount_primary: Decimal::new(10050, 2),
            amount_secondary: Decimal::new(243, 2),
            description: "Lunch".to_string(),
            expense_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        }
    }

    fn ctx() -> FlowContext {
        FlowContext {
            user_id: UserId(10),
            chat_id: ChatId(20),
        }
    }

    fn runner(
        api: FakeApi,
        dir: &Path,
    ) -> (FlowRunner, Arc<FakeApi>, Arc<FakeMessenger>) {
        let api = Arc::new(api);
        let messenger = Arc::new(FakeMessenger::default());
        let runner = FlowRunner::new(api.clone(), messenger.clone(), dir);
        (runner, api, messenger)
    }

    #[tokio::test]
    async fn add_expense_posts_normalized_payload() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, api, messenger) = runner(FakeApi::new(Mode::Ok), dir.path());

        runner.begin(ctx(), Flow::AddExpense).await.unwrap();
        for input in ["Lunch", "05.03.2024", "100.50"] {
            assert!(runner.handle_text(ctx(), input).await.unwrap());
        }

        let creates = api.creates.lock().unwrap().clone();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].owner_id, "10");
        assert_eq!(creates[0].description.as_deref(), Some("Lunch"));
        assert_eq!(creates[0].amount_primary, Decimal::new(10050, 2));
        assert_eq!(
            serde_json::to_value(&creates[0]).unwrap()["expense_date"],
            "2024-03-05"
        );

        let sent = messenger.sent();
        assert_eq!(sent[sent.len() - 2], Sent::Html("Expense added successfully!".to_string()));
        assert_eq!(sent[sent.len() - 1], Sent::Menu(MENU_DONE.to_string()));
        assert_eq!(runner.sessions().current(ctx().user_id).await, FormState::Idle);
    }

    #[tokio::test]
    async fn backend_down_reports_and_still_clears_state() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _api, messenger) = runner(FakeApi::new(Mode::Down), dir.path());

        runner.begin(ctx(), Flow::AddExpense).await.unwrap();
        for input in ["Taxi", "01.02.2024", "50"] {
            runner.handle_text(ctx(), input).await.unwrap();
        }

        let texts = messenger.texts();
        let last = texts.last().unwrap();
        assert!(last.starts_with("An error occurred while sending the expense data:"));
        assert!(last.contains("connection refused"));
        assert!(runner.sessions().current(ctx().user_id).await.is_idle());
    }

    #[tokio::test]
    async fn non_success_status_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _api, messenger) = runner(FakeApi::new(Mode::Status500), dir.path());

        runner.begin(ctx(), Flow::AddExpense).await.unwrap();
        for input in ["Taxi", "01.02.2024", "50"] {
            runner.handle_text(ctx(), input).await.unwrap();
        }
        assert_eq!(
            messenger.texts().last().unwrap(),
            "Failed to add expense. Error: 500"
        );
    }

    #[tokio::test]
    async fn report_sends_spreadsheet_for_range() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(Mode::Ok).with_expenses(vec![sample_expense()]);
        let (runner, api, messenger) = runner(api, dir.path());

        runner.begin(ctx(), Flow::Report).await.unwrap();
        runner.handle_text(ctx(), "01.03.2024").await.unwrap();
        runner.handle_text(ctx(), "31.03.2024").await.unwrap();

        let queries = api.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![ListExpensesQuery {
                owner_id: Some("10".to_string()),
                start_date: Some("2024-03-01".to_string()),
                end_date: Some("2024-03-31".to_string()),
            }]
        );

        let expected = dir
            .path()
            .join("10")
            .join("expenses_2024-03-01-2024-03-31.xlsx");
        assert!(expected.exists());
        assert!(messenger.sent().contains(&Sent::Document(
            expected,
            Some(REPORT_CAPTION.to_string())
        )));
    }

    #[tokio::test]
    async fn empty_report_is_a_message_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _api, messenger) = runner(FakeApi::new(Mode::Ok), dir.path());

        runner.begin(ctx(), Flow::Report).await.unwrap();
        runner.handle_text(ctx(), "01.03.2024").await.unwrap();
        runner.handle_text(ctx(), "31.03.2024").await.unwrap();

        assert!(messenger
            .texts()
            .contains(&"No expenses found for the specified date range.".to_string()));
        assert!(!messenger
            .sent()
            .iter()
            .any(|s| matches!(s, Sent::Document(..))));
    }

    #[tokio::test]
    async fn delete_flow_lists_then_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(Mode::Ok).with_expenses(vec![sample_expense()]);
        let (runner, api, messenger) = runner(api, dir.path());

        runner.begin(ctx(), Flow::DeleteExpense).await.unwrap();
        let sent = messenger.sent();
        assert_eq!(sent[0], Sent::Html(PROMPT_FETCHING.to_string()));
        assert!(matches!(&sent[1], Sent::Document(p, _) if p.ends_with("expenses_all-all.xlsx")));
        assert_eq!(sent[2], Sent::Html(PROMPT_DELETE_ID.to_string()));

        *api.mode.lock().unwrap() = Mode::NotFound;
        runner.handle_text(ctx(), "ghost").await.unwrap();

        assert_eq!(api.deletes.lock().unwrap().clone(), vec!["ghost".to_string()]);
        assert_eq!(
            messenger.texts().last().unwrap(),
            "Expense with ID <code>ghost</code> was not found."
        );
        assert!(runner.sessions().current(ctx().user_id).await.is_idle());
    }

    #[tokio::test]
    async fn delete_flow_without_records_still_asks_for_id() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _api, messenger) = runner(FakeApi::new(Mode::Ok), dir.path());

        runner.begin(ctx(), Flow::DeleteExpense).await.unwrap();
        assert_eq!(
            messenger.texts(),
            vec![
                PROMPT_FETCHING.to_string(),
                "You don't have any expenses.".to_string(),
                PROMPT_DELETE_ID.to_string(),
            ]
        );
        assert_eq!(
            runner.sessions().current(ctx().user_id).await,
            FormState::AwaitingExpenseId
        );
    }

    #[tokio::test]
    async fn update_sends_only_changed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, api, messenger) = runner(FakeApi::new(Mode::Ok), dir.path());

        runner.begin(ctx(), Flow::UpdateExpense).await.unwrap();
        for input in ["e-1", "Dinner", "-", "-"] {
            runner.handle_text(ctx(), input).await.unwrap();
        }

        let updates = api.updates.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec![UpdateExpenseRequest {
                id: "e-1".to_string(),
                description: Some("Dinner".to_string()),
                ..Default::default()
            }]
        );
        assert!(messenger
            .texts()
            .iter()
            .any(|t| t.starts_with("Expense updated.") && t.contains("Dinner")));
    }

    #[tokio::test]
    async fn idle_text_is_not_consumed_and_cancel_resets() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _api, messenger) = runner(FakeApi::new(Mode::Ok), dir.path());

        assert!(!runner.handle_text(ctx(), "hello").await.unwrap());
        assert!(messenger.sent().is_empty());

        runner.begin(ctx(), Flow::AddExpense).await.unwrap();
        assert!(runner.cancel(ctx()).await.unwrap());
        assert!(runner.sessions().current(ctx().user_id).await.is_idle());
        assert!(!runner.cancel(ctx()).await.unwrap());
    }
}
