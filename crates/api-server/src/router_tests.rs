#[cfg(test)]
mod tests {
    use super::super::*;
    use analysis_core::{
        AnalysisError, HistoryProvider, Interval, NewsHeadline, NewsSource, Period, PriceBar,
        PriceHistory, Ticker,
    };
    use analysis_orchestrator::OrchestratorConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Days, NaiveDate};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct FakeHistory {
        bars: usize,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HistoryProvider for FakeHistory {
        async fn fetch(&self, _ticker: &Ticker, _period: Period, _interval: Interval) -> Result<PriceHistory, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::ApiError("chart endpoint returned 502".to_string()));
            }
            let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            let bars = (0..self.bars)
                .map(|i| PriceBar::from_close(start + Days::new(i as u64), 100.0 + i as f64))
                .collect();
            PriceHistory::new(bars)
        }
    }

    struct FakeNews;

    #[async_trait]
    impl NewsSource for FakeNews {
        async fn headlines(&self, _ticker: &Ticker, _limit: usize) -> Result<Vec<NewsHeadline>, AnalysisError> {
            Ok(vec![NewsHeadline {
                title: "Analysts upgrade shares after strong quarter".to_string(),
                publisher: Some("Newswire".to_string()),
                link: Some("https://example.com/story".to_string()),
                published_at: None,
            }])
        }
    }

    fn app_with(history: Arc<FakeHistory>) -> Router {
        let orchestrator =
            DashboardOrchestrator::new(history, Arc::new(FakeNews), OrchestratorConfig::default());
        build_router(AppState::new(orchestrator, ServerConfig::default()))
    }

    fn provider(bars: usize, fail: bool) -> Arc<FakeHistory> {
        Arc::new(FakeHistory {
            bars,
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, headers, body) = get(app_with(provider(0, false)), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["cached_histories"], 0);
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = app_with(provider(0, false))
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_dashboard_with_defaults() {
        let (status, _, body) = get(app_with(provider(40, false)), "/api/dashboard").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["ticker"], "AAPL");
        assert_eq!(data["period"], "1mo");
        assert_eq!(data["interval"], "1d");
        assert_eq!(data["horizon_days"], DEFAULT_HORIZON_DAYS);

        assert_eq!(data["history"]["available"], true);
        assert_eq!(data["history"]["bars"].as_array().unwrap().len(), 40);

        let forecast = &data["forecast"];
        assert_eq!(forecast["available"], true);
        assert!(forecast["message"].is_null());
        let points = forecast["points"].as_array().unwrap();
        assert_eq!(points.len(), DEFAULT_HORIZON_DAYS);
        // Last bar is 2024-04-09
        assert_eq!(points[0]["date"], "2024-04-10");
        assert_eq!(forecast["bands"].as_array().unwrap().len(), DEFAULT_HORIZON_DAYS);

        let headlines = data["sentiment"]["headlines"].as_array().unwrap();
        assert_eq!(headlines.len(), 1);
        assert!(headlines[0]["polarity"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_forecast_endpoint_respects_horizon() {
        let (status, _, body) = get(
            app_with(provider(30, false)),
            "/api/forecast?ticker=msft&period=1y&interval=1d&horizon=5",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ticker"], "MSFT");
        assert_eq!(body["data"]["period"], "1y");
        let points = body["data"]["forecast"]["points"].as_array().unwrap();
        assert_eq!(points.len(), 5);
        assert!(points[0]["value"].as_f64().unwrap() > 129.0);
    }

    #[tokio::test]
    async fn test_short_history_has_forecast_notice() {
        let (_, _, body) = get(app_with(provider(5, false)), "/api/forecast?horizon=10").await;
        let data = &body["data"];
        assert_eq!(data["history"]["available"], true);
        assert_eq!(data["forecast"]["available"], false);
        assert_eq!(data["forecast"]["message"], NO_FORECAST_MESSAGE);
        assert!(data["forecast"]["points"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_degrades_only_its_panes() {
        let (status, _, body) = get(app_with(provider(0, true)), "/api/dashboard?ticker=IBM").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["history"]["message"], NO_HISTORY_MESSAGE);
        assert_eq!(data["forecast"]["message"], NO_FORECAST_MESSAGE);
        assert_eq!(data["sentiment"]["available"], true);
    }

    #[tokio::test]
    async fn test_invalid_ticker_yields_empty_panes_without_fetching() {
        let history = provider(40, false);
        let (status, _, body) = get(app_with(history.clone()), "/api/dashboard?ticker=%24%24%24").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["ticker"], "$$$");
        assert_eq!(data["history"]["message"], NO_HISTORY_MESSAGE);
        assert_eq!(data["forecast"]["message"], NO_FORECAST_MESSAGE);
        assert_eq!(data["sentiment"]["message"], NO_NEWS_MESSAGE);
        assert_eq!(history.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_parameters_are_400() {
        for uri in [
            "/api/dashboard?horizon=0",
            "/api/dashboard?horizon=366",
            "/api/forecast?horizon=abc",
            "/api/history?period=2w",
            "/api/history?interval=1h",
        ] {
            let (status, _, body) = get(app_with(provider(40, false)), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().starts_with("Invalid"));
        }
    }

    #[tokio::test]
    async fn test_history_is_cached_across_endpoints() {
        let history = provider(20, false);
        let app = app_with(history.clone());
        get(app.clone(), "/api/history?ticker=NVDA").await;
        get(app.clone(), "/api/forecast?ticker=NVDA").await;
        let (_, _, health) = get(app, "/api/health").await;
        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
        assert_eq!(health["data"]["cached_histories"], 1);
    }

    #[tokio::test]
    async fn test_sentiment_endpoint() {
        let (_, _, body) = get(app_with(provider(0, false)), "/api/sentiment?ticker=tsla").await;
        let pane = &body["data"]["sentiment"];
        assert_eq!(body["data"]["ticker"], "TSLA");
        assert_eq!(pane["available"], true);
        assert_eq!(pane["headlines"][0]["publisher"], "Newswire");
    }

    #[tokio::test]
    async fn test_index_page_is_served() {
        let response = app_with(provider(0, false))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_404() {
        let (status, _, _) = get(app_with(provider(0, false)), "/assets/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
