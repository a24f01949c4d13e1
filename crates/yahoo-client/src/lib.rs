use analysis_core::{
    AnalysisError, HistoryProvider, Interval, NewsHeadline, NewsSource, Period, PriceHistory, Ticker,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

mod chart;
mod news;

use chart::{history_from_chart, ChartEnvelope};
use news::{headlines_from_search, SearchResponse};

pub const DEFAULT_CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct YahooClientConfig {
    pub chart_url: String,
    pub search_url: String,
    pub timeout: Duration,
}

impl Default for YahooClientConfig {
    fn default() -> Self {
        Self {
            chart_url: DEFAULT_CHART_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Yahoo Finance chart + search client.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    chart_url: String,
    search_url: String,
    timeout: Duration,
}

impl YahooFinanceClient {
    pub fn new(config: YahooClientConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self {
            client,
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            search_url: config.search_url,
            timeout: config.timeout,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.timeout.as_secs())
        } else {
            AnalysisError::ApiError(e.to_string())
        }
    }

    /// Get adjusted price history for the trailing `period` at `interval` granularity
    pub async fn get_history(
        &self,
        ticker: &Ticker,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory, AnalysisError> {
        let url = format!("{}/{}", self.chart_url, ticker);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("range", period.as_str()),
                ("interval", interval.as_str()),
                ("events", "div,splits"),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        // Unknown symbols come back as 404 with a chart.error body
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("No chart data for {} ({} / {})", ticker, period, interval);
            return Ok(PriceHistory::empty());
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        let envelope: ChartEnvelope = response.json().await.map_err(|e| self.map_transport(e))?;
        let history = history_from_chart(envelope)?;

        tracing::debug!(
            "Fetched {} bars for {} ({} / {})",
            history.len(),
            ticker,
            period,
            interval
        );
        Ok(history)
    }

    /// Get the most recent headlines mentioning `ticker`
    pub async fn get_news(&self, ticker: &Ticker, limit: usize) -> Result<Vec<NewsHeadline>, AnalysisError> {
        let news_count = limit.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", ticker.as_str()),
                ("quotesCount", "0"),
                ("newsCount", news_count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::NewsUnavailable(format!("HTTP {}: {}", status, body)));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::NewsUnavailable(e.to_string()))?;

        Ok(headlines_from_search(search, limit))
    }
}

#[async_trait]
impl HistoryProvider for YahooFinanceClient {
    async fn fetch(
        &self,
        ticker: &Ticker,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory, AnalysisError> {
        self.get_history(ticker, period, interval).await
    }
}

#[async_trait]
impl NewsSource for YahooFinanceClient {
    async fn headlines(&self, ticker: &Ticker, limit: usize) -> Result<Vec<NewsHeadline>, AnalysisError> {
        self.get_news(ticker, limit).await
    }
}
