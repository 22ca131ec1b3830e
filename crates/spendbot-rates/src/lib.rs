//! Exchange-rate adapter.
//!
//! Scrapes the USD → UAH converter page on minfin.com.ua. The rate is read
//! from the second cell of the first row of the page's second converter table.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use spendbot_core::{
    errors::Error,
    ports::{RateError, RateSource},
    Result,
};
use tracing::debug;

/// Path of the rate cell, anchored at `<body>`.
const RATE_CELL_SELECTOR: &str = "body > main > div > div > section > div > div > div > \
     section:nth-of-type(2) > div > table > tbody > tr:nth-of-type(1) > td:nth-of-type(2)";

#[derive(Clone, Debug)]
pub struct MinfinRateSource {
    url: String,
    http: reqwest::Client,
}

impl MinfinRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("rate client build error: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for MinfinRateSource {
    async fn usd_to_local(&self) -> std::result::Result<f64, RateError> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;
        let rate = parse_rate(&body)?;
        debug!(rate, url = %self.url, "fetched exchange rate");
        Ok(rate)
    }
}

/// Extract the rate from the converter page.
pub fn parse_rate(html: &str) -> std::result::Result<f64, RateError> {
    let selector =
        Selector::parse(RATE_CELL_SELECTOR).map_err(|e| RateError::Parse(e.to_string()))?;
    let doc = Html::parse_document(html);

    let cell = doc.select(&selector).next().ok_or(RateError::NotFound)?;
    let Some(text) = cell.text().next() else {
        return Err(RateError::NotFound);
    };

    let raw = text.trim();
    raw.replace(',', ".")
        .parse::<f64>()
        .map_err(|_| RateError::Parse(raw.to_string()))
}
