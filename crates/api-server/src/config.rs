use analysis_orchestrator::OrchestratorConfig;
use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;
use yahoo_client::{YahooClientConfig, DEFAULT_CHART_URL, DEFAULT_SEARCH_URL};

/// Server configuration, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub history_timeout_secs: u64,
    pub news_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub yahoo_chart_url: String,
    pub yahoo_search_url: String,
    pub default_ticker: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 3000,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
            history_timeout_secs: 10,
            news_timeout_secs: 8,
            request_timeout_secs: 30,
            yahoo_chart_url: DEFAULT_CHART_URL.into(),
            yahoo_search_url: DEFAULT_SEARCH_URL.into(),
            default_ticker: "AAPL".into(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        Ok(Self {
            bind_addr: env_or("BIND_ADDR", d.bind_addr)?,
            port: env_or("PORT", d.port)?,
            cache_ttl_secs: env_or("CACHE_TTL_SECS", d.cache_ttl_secs)?,
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", d.cache_max_entries)?,
            history_timeout_secs: env_or("HISTORY_TIMEOUT_SECS", d.history_timeout_secs)?,
            news_timeout_secs: env_or("NEWS_TIMEOUT_SECS", d.news_timeout_secs)?,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", d.request_timeout_secs)?,
            yahoo_chart_url: env_or("YAHOO_CHART_URL", d.yahoo_chart_url)?,
            yahoo_search_url: env_or("YAHOO_SEARCH_URL", d.yahoo_search_url)?,
            default_ticker: env_or("DEFAULT_TICKER", d.default_ticker)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_max_entries: self.cache_max_entries,
            history_timeout: Duration::from_secs(self.history_timeout_secs),
            news_timeout: Duration::from_secs(self.news_timeout_secs),
        }
    }

    pub fn yahoo_config(&self) -> YahooClientConfig {
        YahooClientConfig {
            chart_url: self.yahoo_chart_url.clone(),
            search_url: self.yahoo_search_url.clone(),
            timeout: Duration::from_secs(self.history_timeout_secs.max(self.news_timeout_secs)),
        }
    }
}
