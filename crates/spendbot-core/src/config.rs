use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use rust_decimal::Decimal;

use crate::{errors::Error, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_RATE_SOURCE_URL: &str = "https://minfin.com.ua/currency/converter/usd-uah/";

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub telegram_bot_token: String,
    /// Base URL of the expense backend, without a trailing slash.
    pub backend_url: String,
    /// Root for generated reports; one subdirectory per user.
    pub reports_dir: PathBuf,
    pub request_timeout: Duration,
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .or_else(|| env_str("BOT_TOKEN"))
            .unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let backend_url = normalize_base_url(
            &env_str("BACKEND_URL")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        );
        let reports_dir = env_path("REPORTS_DIR").unwrap_or_else(|| PathBuf::from("expenses_data"));
        let request_timeout =
            Duration::from_secs(env_u64("BACKEND_TIMEOUT_SECS").unwrap_or(30));

        fs::create_dir_all(&reports_dir)?;

        Ok(Self {
            telegram_bot_token,
            backend_url,
            reports_dir,
            request_timeout,
        })
    }
}

/// Typed configuration for the backend process.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub rate_source_url: String,
    pub fallback_rate: Decimal,
    pub rate_timeout: Duration,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bind_addr = env_str("SERVER_ADDR")
            .and_then(non_empty)
            .unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let bind_addr = SocketAddr::from_str(bind_addr.trim())
            .map_err(|e| Error::Config(format!("SERVER_ADDR is invalid: {e}")))?;

        let db_name = env_str("SQLITE_DB_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "db.sqlite3".to_string());
        let database_url = sqlite_url(&db_name);

        let rate_source_url = env_str("RATE_SOURCE_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_RATE_SOURCE_URL.to_string());
        let fallback_rate = parse_fallback_rate(env_str("FALLBACK_USD_RATE"))?;
        let rate_timeout = Duration::from_secs(env_u64("RATE_TIMEOUT_SECS").unwrap_or(10));

        Ok(Self {
            bind_addr,
            database_url,
            rate_source_url,
            fallback_rate,
            rate_timeout,
        })
    }
}

fn sqlite_url(db_name: &str) -> String {
    if db_name.starts_with("sqlite:") {
        db_name.to_string()
    } else {
        format!("sqlite:{db_name}")
    }
}

fn parse_fallback_rate(v: Option<String>) -> Result<Decimal> {
    let Some(raw) = v.and_then(non_empty) else {
        return Ok(Decimal::from(42));
    };
    let rate = Decimal::from_str(raw.trim())
        .map_err(|e| Error::Config(format!("FALLBACK_USD_RATE is not a number: {e}")))?;
    if rate <= Decimal::ZERO {
        return Err(Error::Config(
            "FALLBACK_USD_RATE must be positive".to_string(),
        ));
    }
    Ok(rate)
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
