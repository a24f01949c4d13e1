use analysis_core::NewsHeadline;
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchNewsItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "providerPublishTime")]
    pub provider_publish_time: Option<i64>,
}

/// Newest-first headlines, skipping items without a usable title.
pub(crate) fn headlines_from_search(response: SearchResponse, limit: usize) -> Vec<NewsHeadline> {
    let mut headlines: Vec<NewsHeadline> = response
        .news
        .into_iter()
        .filter_map(|item| {
            let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            Some(NewsHeadline {
                title,
                publisher: item.publisher,
                link: item.link,
                published_at: item
                    .provider_publish_time
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            })
        })
        .collect();

    // Undated items sort last.
    headlines.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    headlines.truncate(limit);
    headlines
}
