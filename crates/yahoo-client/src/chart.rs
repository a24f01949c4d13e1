//! Chart endpoint payloads and their conversion into [`PriceHistory`].

use analysis_core::{AnalysisError, PriceBar, PriceHistory};
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default, rename = "gmtoffset")]
    pub gmt_offset: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseSeries>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuoteSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdjCloseSeries {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

fn finite_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// Convert a chart payload into split/dividend adjusted bars.
///
/// Incomplete rows are dropped. A repeated date keeps the later row.
pub(crate) fn history_from_chart(envelope: ChartEnvelope) -> Result<PriceHistory, AnalysisError> {
    if let Some(err) = envelope.chart.error {
        tracing::debug!(
            "Yahoo chart error {}: {}",
            err.code,
            err.description.as_deref().unwrap_or("no description")
        );
        return Ok(PriceHistory::empty());
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceHistory::empty());
    };

    let Some(quote) = result.indicators.quote.first() else {
        return Ok(PriceHistory::empty());
    };
    let adjclose = result
        .indicators
        .adjclose
        .first()
        .map(|a| a.adjclose.as_slice())
        .unwrap_or(&[]);

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    let mut dropped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            finite_at(&quote.open, i),
            finite_at(&quote.high, i),
            finite_at(&quote.low, i),
            finite_at(&quote.close, i),
        ) else {
            dropped += 1;
            continue;
        };
        if close <= 0.0 {
            dropped += 1;
            continue;
        }
        let Some(local) = ts
            .checked_add(result.meta.gmt_offset)
            .and_then(|t| DateTime::from_timestamp(t, 0))
        else {
            dropped += 1;
            continue;
        };

        let ratio = match finite_at(adjclose, i) {
            Some(adj) if adj > 0.0 => adj / close,
            _ => 1.0,
        };
        let volume = finite_at(&quote.volume, i).unwrap_or(0.0).max(0.0) as u64;

        let bar = PriceBar {
            date: local.date_naive(),
            open: open * ratio,
            high: high * ratio,
            low: low * ratio,
            close: close * ratio,
            volume,
        };

        match bars.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            Some(last) if last.date > bar.date => dropped += 1,
            _ => bars.push(bar),
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} incomplete chart rows", dropped);
    }

    PriceHistory::new(bars)
}
