use std::sync::Arc;

use spendbot_core::{config::ServerConfig, logging};
use spendbot_rates::MinfinRateSource;
use spendbot_server::{
    create_router,
    storage::{DbConnection, SqliteExpenseStore},
    AppState, ExpenseService,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServerConfig::load()?;
    logging::init("spendbot-server")?;

    info!("Setting up database {}", cfg.database_url);
    let db = DbConnection::new(&cfg.database_url).await?;

    let rates = MinfinRateSource::new(cfg.rate_source_url.clone(), cfg.rate_timeout)?;
    let service = ExpenseService::new(
        Arc::new(SqliteExpenseStore::new(db)),
        Arc::new(rates),
        cfg.fallback_rate,
    );
    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    info!("Listening on {}", cfg.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
