use async_trait::async_trait;
use crate::{AnalysisError, Interval, NewsHeadline, Period, PriceHistory, Ticker};

/// Source of adjusted price history.
///
/// An unknown ticker or an empty window is `Ok` with an empty history;
/// `Err` is reserved for transport and decoding failures.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch(
        &self,
        ticker: &Ticker,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory, AnalysisError>;
}

/// Source of recent headlines for a ticker, newest first.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn headlines(&self, ticker: &Ticker, limit: usize) -> Result<Vec<NewsHeadline>, AnalysisError>;
}
