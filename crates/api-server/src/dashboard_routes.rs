//! Dashboard API routes
//!
//! One endpoint per pane plus a combined one. Every endpoint answers 200
//! with per-pane `available`/`message` fields; only malformed period,
//! interval or horizon values are rejected.

use analysis_core::{
    AnalysisError, ForecastBand, ForecastPoint, ForecastResult, HeadlineSentiment, Interval, ModelSummary, Period,
    PriceBar, PriceHistory, Ticker,
};
use analysis_orchestrator::HistoryRequest;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

pub const DEFAULT_HORIZON_DAYS: usize = 30;
pub const MAX_HORIZON_DAYS: usize = 365;

pub const NO_HISTORY_MESSAGE: &str = "No historical data available.";
pub const NO_FORECAST_MESSAGE: &str = "Forecast not available. Need more historical data.";
pub const NO_NEWS_MESSAGE: &str = "No recent news available.";

/// Raw query parameters; blanks fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
    pub horizon: Option<String>,
}

/// Validated user input for one interaction.
struct Selection {
    /// `None` when the symbol is syntactically invalid
    ticker: Option<Ticker>,
    symbol: String,
    period: Period,
    interval: Interval,
    horizon_days: usize,
}

impl Selection {
    fn history_request(&self) -> Option<HistoryRequest> {
        self.ticker
            .clone()
            .map(|t| HistoryRequest::new(t, self.period, self.interval))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_selection(query: &DashboardQuery, default_ticker: &str) -> Result<Selection, AppError> {
    let raw_ticker = non_blank(&query.ticker).unwrap_or(default_ticker);
    let ticker = match Ticker::parse(raw_ticker) {
        Ok(t) => Some(t),
        Err(e) => {
            let unavailable =
                AnalysisError::DataUnavailable(format!("ticker {:?}: {}", raw_ticker, e));
            tracing::info!("{}", unavailable);
            None
        }
    };
    let symbol = ticker
        .as_ref()
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| raw_ticker.trim().to_uppercase());

    let period = match non_blank(&query.period) {
        Some(raw) => raw.parse::<Period>().map_err(|_| {
            AppError::bad_request(format!(
                "Invalid period {:?}; expected one of {}",
                raw,
                Period::ALL.map(|p| p.as_str()).join(", ")
            ))
        })?,
        None => Period::default(),
    };

    let interval = match non_blank(&query.interval) {
        Some(raw) => raw.parse::<Interval>().map_err(|_| {
            AppError::bad_request(format!(
                "Invalid interval {:?}; expected one of {}",
                raw,
                Interval::ALL.map(|i| i.as_str()).join(", ")
            ))
        })?,
        None => Interval::default(),
    };

    let horizon_days = match non_blank(&query.horizon) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(h) if (1..=MAX_HORIZON_DAYS).contains(&h) => h,
            _ => {
                return Err(AppError::bad_request(format!(
                    "Invalid horizon {:?}; expected a whole number of days from 1 to {}",
                    raw, MAX_HORIZON_DAYS
                )))
            }
        },
        None => DEFAULT_HORIZON_DAYS,
    };

    Ok(Selection {
        ticker,
        symbol,
        period,
        interval,
        horizon_days,
    })
}

fn notice(available: bool, message: &str) -> Option<String> {
    (!available).then(|| message.to_string())
}

#[derive(Debug, Serialize)]
pub struct HistoryPane {
    pub available: bool,
    pub message: Option<String>,
    pub bars: Vec<PriceBar>,
}

impl From<&PriceHistory> for HistoryPane {
    fn from(history: &PriceHistory) -> Self {
        let available = !history.is_empty();
        Self {
            available,
            message: notice(available, NO_HISTORY_MESSAGE),
            bars: history.bars().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastPane {
    pub available: bool,
    pub message: Option<String>,
    pub horizon_days: usize,
    pub points: Vec<ForecastPoint>,
    pub bands: Vec<ForecastBand>,
    pub model: Option<ModelSummary>,
}

impl ForecastPane {
    fn new(forecast: ForecastResult, horizon_days: usize) -> Self {
        let available = !forecast.is_empty();
        Self {
            available,
            message: notice(available, NO_FORECAST_MESSAGE),
            horizon_days,
            points: forecast.points,
            bands: forecast.bands,
            model: forecast.model,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SentimentPane {
    pub available: bool,
    pub message: Option<String>,
    pub headlines: Vec<HeadlineSentiment>,
}

impl From<Vec<HeadlineSentiment>> for SentimentPane {
    fn from(headlines: Vec<HeadlineSentiment>) -> Self {
        let available = !headlines.is_empty();
        Self {
            available,
            message: notice(available, NO_NEWS_MESSAGE),
            headlines,
        }
    }
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    pub history: HistoryPane,
}

#[derive(Serialize)]
pub struct ForecastResponse {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    pub history: HistoryPane,
    pub forecast: ForecastPane,
}

#[derive(Serialize)]
pub struct SentimentResponse {
    pub ticker: String,
    pub sentiment: SentimentPane,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    pub horizon_days: usize,
    pub history: HistoryPane,
    pub forecast: ForecastPane,
    pub sentiment: SentimentPane,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/history", get(get_history))
        .route("/api/forecast", get(get_forecast))
        .route("/api/sentiment", get(get_sentiment))
        .route("/api/dashboard", get(get_dashboard))
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<HistoryResponse>>, AppError> {
    let selection = parse_selection(&query, &state.config.default_ticker)?;

    let history = match selection.history_request() {
        Some(request) => state.orchestrator.get_history(&request).await,
        None => PriceHistory::empty(),
    };

    Ok(Json(ApiResponse::success(HistoryResponse {
        ticker: selection.symbol,
        period: selection.period,
        interval: selection.interval,
        history: HistoryPane::from(&history),
    })))
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<ForecastResponse>>, AppError> {
    let selection = parse_selection(&query, &state.config.default_ticker)?;

    let (history, forecast) = match selection.history_request() {
        Some(request) => {
            state
                .orchestrator
                .get_forecast(&request, selection.horizon_days)
                .await
        }
        None => (PriceHistory::empty(), ForecastResult::unavailable()),
    };

    Ok(Json(ApiResponse::success(ForecastResponse {
        ticker: selection.symbol,
        period: selection.period,
        interval: selection.interval,
        history: HistoryPane::from(&history),
        forecast: ForecastPane::new(forecast, selection.horizon_days),
    })))
}

async fn get_sentiment(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<SentimentResponse>>, AppError> {
    let selection = parse_selection(&query, &state.config.default_ticker)?;

    let headlines = match &selection.ticker {
        Some(ticker) => state.orchestrator.get_sentiment(ticker).await,
        None => Vec::new(),
    };

    Ok(Json(ApiResponse::success(SentimentResponse {
        ticker: selection.symbol,
        sentiment: SentimentPane::from(headlines),
    })))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let selection = parse_selection(&query, &state.config.default_ticker)?;

    let (history, forecast, headlines) = match selection.history_request() {
        Some(request) => {
            let snapshot = state
                .orchestrator
                .dashboard(&request, selection.horizon_days)
                .await;
            (snapshot.history, snapshot.forecast, snapshot.sentiment)
        }
        None => (
            PriceHistory::empty(),
            ForecastResult::unavailable(),
            Vec::new(),
        ),
    };

    Ok(Json(ApiResponse::success(DashboardResponse {
        ticker: selection.symbol,
        period: selection.period,
        interval: selection.interval,
        horizon_days: selection.horizon_days,
        history: HistoryPane::from(&history),
        forecast: ForecastPane::new(forecast, selection.horizon_days),
        sentiment: SentimentPane::from(headlines),
    })))
}
