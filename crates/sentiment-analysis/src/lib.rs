use analysis_core::{AnalysisError, HeadlineSentiment, NewsHeadline, NewsSource, Ticker};
use std::sync::Arc;
use std::time::Duration;

pub mod polarity;
pub use polarity::PolarityScorer;

/// Headlines scored per request.
pub const MAX_HEADLINES: usize = 10;

const DEFAULT_NEWS_TIMEOUT: Duration = Duration::from_secs(8);

/// Retrieves recent headlines for a ticker and scores each one.
pub struct SentimentScorer {
    source: Arc<dyn NewsSource>,
    polarity: PolarityScorer,
    timeout: Duration,
}

impl SentimentScorer {
    pub fn new(source: Arc<dyn NewsSource>) -> Self {
        Self {
            source,
            polarity: PolarityScorer::new(),
            timeout: DEFAULT_NEWS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Scored headlines, or an empty list when news can't be retrieved.
    pub async fn score(&self, ticker: &Ticker) -> Vec<HeadlineSentiment> {
        match self.try_score(ticker).await {
            Ok(scored) => scored,
            Err(e) => {
                tracing::warn!("No news sentiment for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    pub async fn try_score(&self, ticker: &Ticker) -> Result<Vec<HeadlineSentiment>, AnalysisError> {
        let headlines = tokio::time::timeout(self.timeout, self.source.headlines(ticker, MAX_HEADLINES))
            .await
            .map_err(|_| AnalysisError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| match e {
                AnalysisError::NewsUnavailable(_) | AnalysisError::Timeout(_) => e,
                other => AnalysisError::NewsUnavailable(other.to_string()),
            })?;

        let scored = self.score_headlines(headlines);
        tracing::debug!("Scored {} headlines for {}", scored.len(), ticker);
        Ok(scored)
    }

    /// Score at most [`MAX_HEADLINES`] headlines, skipping blank titles.
    pub fn score_headlines(&self, headlines: Vec<NewsHeadline>) -> Vec<HeadlineSentiment> {
        headlines
            .into_iter()
            .filter(|h| !h.title.trim().is_empty())
            .take(MAX_HEADLINES)
            .map(|h| HeadlineSentiment {
                polarity: self.polarity.polarity(&h.title),
                headline: h.title,
                publisher: h.publisher,
                link: h.link,
                published_at: h.published_at,
            })
            .collect()
    }
}
