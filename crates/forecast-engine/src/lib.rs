use analysis_core::{AnalysisError, ForecastBand, ForecastPoint, ForecastResult, PriceHistory};
use chrono::Days;

pub mod arima;
pub use arima::{ArimaModel, ArimaOrder};


/// Below this many bars no model is fitted at all.
pub const MIN_OBSERVATIONS: usize = 10;

/// ARIMA(5,1,0) on closing prices.
pub const FORECAST_ORDER: ArimaOrder = ArimaOrder::new(5, 1, 0);

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Projects closing prices forward over a calendar-day horizon.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    order: ArimaOrder,
    min_observations: usize,
    confidence: f64,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self {
            order: FORECAST_ORDER,
            min_observations: MIN_OBSERVATIONS,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Forecast `horizon_days` closes, or the empty result when the history
    /// is too short or the model can't be fitted.
    pub fn forecast(&self, history: &PriceHistory, horizon_days: usize) -> ForecastResult {
        match self.try_forecast(history, horizon_days) {
            Ok(result) => result,
            Err(AnalysisError::InsufficientData(msg)) => {
                tracing::debug!("Forecast skipped: {}", msg);
                ForecastResult::unavailable()
            }
            Err(e) => {
                tracing::warn!("Forecast unavailable: {}", e);
                ForecastResult::unavailable()
            }
        }
    }

    pub fn try_forecast(
        &self,
        history: &PriceHistory,
        horizon_days: usize,
    ) -> Result<ForecastResult, AnalysisError> {
        if horizon_days == 0 {
            return Err(AnalysisError::InvalidData(
                "forecast horizon must be at least one day".to_string(),
            ));
        }
        if history.len() < self.min_observations {
            return Err(AnalysisError::InsufficientData(format!(
                "{} bars available, {} required",
                history.len(),
                self.min_observations
            )));
        }
        let Some(last_date) = history.last_date() else {
            return Err(AnalysisError::InsufficientData("empty history".to_string()));
        };

        let model = ArimaModel::fit(&history.closes(), self.order)?;
        let values = model.forecast(horizon_days)?;
        let intervals = model.forecast_interval(horizon_days, self.confidence)?;

        let mut points = Vec::with_capacity(horizon_days);
        let mut bands = Vec::with_capacity(horizon_days);
        for (step, (value, (lower, upper))) in values.into_iter().zip(intervals).enumerate() {
            // Calendar days, weekends included.
            let date = last_date
                .checked_add_days(Days::new(step as u64 + 1))
                .ok_or_else(|| {
                    AnalysisError::ModelFitFailure(format!(
                        "forecast date overflows the calendar after {}",
                        last_date
                    ))
                })?;
            points.push(ForecastPoint { date, value });
            bands.push(ForecastBand {
                date,
                lower,
                upper,
                confidence: self.confidence,
            });
        }

        tracing::debug!(
            "ARIMA({},{},{}) fitted on {} closes, projected {} days",
            self.order.p,
            self.order.d,
            self.order.q,
            history.len(),
            horizon_days
        );

        Ok(ForecastResult {
            points,
            bands,
            model: Some(model.summary()),
        })
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}
