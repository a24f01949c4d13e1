use analysis_core::{
    AnalysisError, ForecastResult, HeadlineSentiment, HistoryProvider, Interval, NewsSource,
    Period, PriceHistory, Ticker,
};
use forecast_engine::ForecastEngine;
use sentiment_analysis::SentimentScorer;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub mod cache;
pub use cache::TtlCache;

const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;
const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NEWS_TIMEOUT_SECS: u64 = 8;

/// What to fetch: one ticker over one period at one sampling interval.
/// Also the history cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HistoryRequest {
    pub ticker: Ticker,
    pub period: Period,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(ticker: Ticker, period: Period, interval: Interval) -> Self {
        Self { ticker, period, interval }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub history_timeout: Duration,
    pub news_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            history_timeout: Duration::from_secs(DEFAULT_HISTORY_TIMEOUT_SECS),
            news_timeout: Duration::from_secs(DEFAULT_NEWS_TIMEOUT_SECS),
        }
    }
}

/// Everything one dashboard refresh shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub request: HistoryRequest,
    pub horizon_days: usize,
    pub history: PriceHistory,
    pub forecast: ForecastResult,
    pub sentiment: Vec<HeadlineSentiment>,
}

/// Runs the three dashboard pipelines. Each one degrades to its own empty
/// value on failure without affecting the others.
pub struct DashboardOrchestrator {
    history_provider: Arc<dyn HistoryProvider>,
    sentiment_scorer: SentimentScorer,
    forecast_engine: ForecastEngine,
    /// Successful fetches per (ticker, period, interval)
    history_cache: TtlCache<HistoryRequest, PriceHistory>,
    history_timeout: Duration,
}

impl DashboardOrchestrator {
    pub fn new(
        history_provider: Arc<dyn HistoryProvider>,
        news_source: Arc<dyn NewsSource>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            history_provider,
            sentiment_scorer: SentimentScorer::new(news_source).with_timeout(config.news_timeout),
            forecast_engine: ForecastEngine::new(),
            history_cache: TtlCache::new(config.cache_ttl, config.cache_max_entries),
            history_timeout: config.history_timeout,
        }
    }

    /// Number of live history cache entries
    pub fn cache_len(&self) -> usize {
        self.history_cache.len()
    }

    /// Price history, or the empty history when the provider fails.
    pub async fn get_history(&self, request: &HistoryRequest) -> PriceHistory {
        match self.try_get_history(request).await {
            Ok(history) => history,
            Err(e @ AnalysisError::DataUnavailable(_)) => {
                tracing::info!("{}", e);
                PriceHistory::empty()
            }
            Err(e) => {
                tracing::warn!(
                    "No price history for {} ({}, {}): {}",
                    request.ticker,
                    request.period,
                    request.interval,
                    e
                );
                PriceHistory::empty()
            }
        }
    }

    /// Get price history (cached). Failures are never cached; a fetch that
    /// yields no bars is cached but reported as `DataUnavailable`.
    pub async fn try_get_history(&self, request: &HistoryRequest) -> Result<PriceHistory, AnalysisError> {
        let history = match self.history_cache.get(request) {
            Some(history) => {
                tracing::debug!("History cache hit for {}", request.ticker);
                history
            }
            None => {
                let history = tokio::time::timeout(
                    self.history_timeout,
                    self.history_provider
                        .fetch(&request.ticker, request.period, request.interval),
                )
                .await
                .map_err(|_| AnalysisError::Timeout(self.history_timeout.as_secs()))??;

                tracing::info!(
                    "Fetched {} bars for {} ({}, {})",
                    history.len(),
                    request.ticker,
                    request.period,
                    request.interval
                );
                self.history_cache.insert(request.clone(), history.clone());
                history
            }
        };

        if history.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "no price bars for {} ({}, {})",
                request.ticker, request.period, request.interval
            )));
        }
        Ok(history)
    }

    /// Fit and project off the async workers.
    pub async fn forecast(&self, history: &PriceHistory, horizon_days: usize) -> ForecastResult {
        if history.is_empty() {
            return ForecastResult::unavailable();
        }

        let engine = self.forecast_engine.clone();
        let history = history.clone();
        match tokio::task::spawn_blocking(move || engine.forecast(&history, horizon_days)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Forecast task failed: {}", e);
                ForecastResult::unavailable()
            }
        }
    }

    pub async fn get_forecast(&self, request: &HistoryRequest, horizon_days: usize) -> (PriceHistory, ForecastResult) {
        let history = self.get_history(request).await;
        let forecast = self.forecast(&history, horizon_days).await;
        (history, forecast)
    }

    pub async fn get_sentiment(&self, ticker: &Ticker) -> Vec<HeadlineSentiment> {
        self.sentiment_scorer.score(ticker).await
    }

    /// History, forecast and sentiment for one refresh. News is fetched
    /// concurrently with the history and forecast chain.
    pub async fn dashboard(&self, request: &HistoryRequest, horizon_days: usize) -> DashboardSnapshot {
        tracing::info!(
            "Building dashboard for {} (period: {}, interval: {}, horizon: {})",
            request.ticker,
            request.period,
            request.interval,
            horizon_days
        );

        let ((history, forecast), sentiment) = tokio::join!(
            self.get_forecast(request, horizon_days),
            self.get_sentiment(&request.ticker),
        );

        DashboardSnapshot {
            request: request.clone(),
            horizon_days,
            history,
            forecast,
            sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{NewsHeadline, PriceBar};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeHistory {
        bars: usize,
        fail: bool,
        hang: bool,
        calls: AtomicUsize,
    }

    impl FakeHistory {
        fn with_bars(bars: usize) -> Self {
            Self { bars, fail: false, hang: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { bars: 0, fail: true, hang: false, calls: AtomicUsize::new(0) }
        }

        fn hanging() -> Self {
            Self { bars: 0, fail: false, hang: true, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl HistoryProvider for FakeHistory {
        async fn fetch(&self, _ticker: &Ticker, _period: Period, _interval: Interval) -> Result<PriceHistory, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail {
                return Err(AnalysisError::ApiError("upstream returned 500".to_string()));
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let bars = (0..self.bars)
                .map(|i| PriceBar::from_close(start + chrono::Days::new(i as u64), 100.0 + i as f64))
                .collect();
            PriceHistory::new(bars)
        }
    }

    struct FakeNews {
        fail: bool,
    }

    #[async_trait]
    impl NewsSource for FakeNews {
        async fn headlines(&self, _ticker: &Ticker, _limit: usize) -> Result<Vec<NewsHeadline>, AnalysisError> {
            if self.fail {
                return Err(AnalysisError::NewsUnavailable("search endpoint down".to_string()));
            }
            Ok(vec![NewsHeadline {
                title: "Shares rally on strong demand".to_string(),
                publisher: None,
                link: None,
                published_at: None,
            }])
        }
    }

    fn orchestrator(history: Arc<FakeHistory>, news_fails: bool) -> DashboardOrchestrator {
        DashboardOrchestrator::new(
            history,
            Arc::new(FakeNews { fail: news_fails }),
            OrchestratorConfig::default(),
        )
    }

    fn request(symbol: &str) -> HistoryRequest {
        HistoryRequest::new(Ticker::parse(symbol).unwrap(), Period::Year1, Interval::Day1)
    }

    #[tokio::test]
    async fn test_dashboard_with_full_data() {
        let orch = orchestrator(Arc::new(FakeHistory::with_bars(30)), false);
        let snapshot = orch.dashboard(&request("AAPL"), 5).await;

        assert_eq!(snapshot.history.len(), 30);
        assert_eq!(snapshot.forecast.len(), 5);
        assert_eq!(snapshot.sentiment.len(), 1);
        assert!(snapshot.sentiment[0].polarity > 0.0);
    }

    #[tokio::test]
    async fn test_history_failure_leaves_sentiment_intact() {
        let orch = orchestrator(Arc::new(FakeHistory::failing()), false);
        let snapshot = orch.dashboard(&request("AAPL"), 30).await;

        assert!(snapshot.history.is_empty());
        assert!(snapshot.forecast.is_empty());
        assert_eq!(snapshot.sentiment.len(), 1);
    }

    #[tokio::test]
    async fn test_news_failure_leaves_history_and_forecast_intact() {
        let orch = orchestrator(Arc::new(FakeHistory::with_bars(40)), true);
        let snapshot = orch.dashboard(&request("AAPL"), 7).await;

        assert_eq!(snapshot.history.len(), 40);
        assert_eq!(snapshot.forecast.len(), 7);
        assert!(snapshot.sentiment.is_empty());
    }

    #[tokio::test]
    async fn test_short_history_has_no_forecast() {
        let orch = orchestrator(Arc::new(FakeHistory::with_bars(6)), false);
        let snapshot = orch.dashboard(&request("NEWCO"), 30).await;

        assert_eq!(snapshot.history.len(), 6);
        assert!(snapshot.forecast.is_empty());
    }

    #[tokio::test]
    async fn test_successful_history_is_cached() {
        let provider = Arc::new(FakeHistory::with_bars(12));
        let orch = orchestrator(provider.clone(), false);

        orch.get_history(&request("AAPL")).await;
        orch.get_history(&request("AAPL")).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.cache_len(), 1);

        let mut other = request("AAPL");
        other.period = Period::Month3;
        orch.get_history(&other).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider = Arc::new(FakeHistory::failing());
        let orch = orchestrator(provider.clone(), false);

        assert!(orch.get_history(&request("AAPL")).await.is_empty());
        assert!(orch.get_history(&request("AAPL")).await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(orch.cache_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_history_times_out() {
        let orch = orchestrator(Arc::new(FakeHistory::hanging()), false);
        let result = orch.try_get_history(&request("AAPL")).await;
        assert!(matches!(result, Err(AnalysisError::Timeout(DEFAULT_HISTORY_TIMEOUT_SECS))));
    }

    #[tokio::test]
    async fn test_empty_history_is_data_unavailable() {
        let provider = Arc::new(FakeHistory::with_bars(0));
        let orch = orchestrator(provider.clone(), false);

        let err = orch.try_get_history(&request("ZZZZ")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::DataUnavailable(_)));

        // The empty answer is cached, so the lookup is not repeated.
        assert!(orch.get_history(&request("ZZZZ")).await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.cache_len(), 1);

        let snapshot = orch.dashboard(&request("ZZZZ"), 30).await;
        assert!(snapshot.history.is_empty());
        assert!(snapshot.forecast.is_empty());
        assert_eq!(snapshot.sentiment.len(), 1);
    }

    #[tokio::test]
    async fn test_forecast_of_empty_history_is_unavailable() {
        let orch = orchestrator(Arc::new(FakeHistory::with_bars(0)), false);
        let forecast = orch.forecast(&PriceHistory::empty(), 30).await;
        assert!(forecast.is_empty());
        assert!(forecast.model.is_none());
    }
}
