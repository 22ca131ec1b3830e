//! HTTP adapter for the expense backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use spendbot_core::{
    domain::{
        CreateExpenseRequest, DeleteResponse, ErrorBody, Expense, ListExpensesQuery,
        UpdateExpenseRequest,
    },
    errors::Error,
    ports::ExpenseApi,
    Result,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct HttpExpenseApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpExpenseApi {
    /// `base_url` without a trailing slash, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<B, T>(&self, method: reqwest::Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        read_json(resp).await
    }
}

#[async_trait]
impl ExpenseApi for HttpExpenseApi {
    async fn create_expense(&self, req: &CreateExpenseRequest) -> Result<Expense> {
        debug!(owner = %req.owner_id, "POST /expense");
        self.send_json(reqwest::Method::POST, "/expense", req).await
    }

    async fn list_expenses(&self, query: &ListExpensesQuery) -> Result<Vec<Expense>> {
        debug!(?query, "GET /expenses");
        let resp = self
            .http
            .get(self.url("/expenses"))
            .query(query)
            .send()
            .await
            .map_err(network_error)?;
        read_json(resp).await
    }

    async fn update_expense(&self, req: &UpdateExpenseRequest) -> Result<Expense> {
        debug!(id = %req.id, "PUT /expense");
        self.send_json(reqwest::Method::PUT, "/expense", req).await
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<String> {
        debug!(id = expense_id, "DELETE /expense");
        let resp = self
            .http
            .delete(self.url(&format!("/expense/{expense_id}")))
            .send()
            .await
            .map_err(network_error)?;
        let body: DeleteResponse = read_json(resp).await?;
        Ok(body.message)
    }
}

fn network_error(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// Non-success statuses become `Error::Status`, carrying the backend's
/// `detail` when the body has one.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|b| b.detail);
        return Err(Error::Status {
            status: status.as_u16(),
            detail,
        });
    }
    resp.json::<T>().await.map_err(network_error)
}
