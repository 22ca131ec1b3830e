use std::sync::Arc;

use spendbot_client::HttpExpenseApi;
use spendbot_core::{config::BotConfig, ports::ExpenseApi};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), spendbot_core::Error> {
    spendbot_core::logging::init("spendbot")?;

    let cfg = Arc::new(BotConfig::load()?);
    info!("Using backend {}", cfg.backend_url);

    let api: Arc<dyn ExpenseApi> = Arc::new(HttpExpenseApi::new(
        cfg.backend_url.clone(),
        cfg.request_timeout,
    )?);

    spendbot_telegram::router::run_polling(cfg, api)
        .await
        .map_err(|e| spendbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
