//! crates/dashboard_core/src/slices/news.rs
//!
//! Two independent news caches: the paginated NewsData.io feed and a Hacker
//! News batch. Both fetches retry with a linearly increasing pause.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::domain::{HackerNewsArticle, NewsDataArticle};
use crate::messages::DATA_ERROR;
use crate::slices::FetchOutcome;
use crate::store::Store;

pub const NEWS_DATA_FETCH_ATTEMPTS: u32 = 2;
pub const HACKER_NEWS_FETCH_ATTEMPTS: u32 = 2;
pub const HACKER_NEWS_FETCH_LIMIT: usize = 48;
/// Attempt `n` (zero-based) waits `n * NEWS_RETRY_BACKOFF` first.
pub const NEWS_RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsState {
    pub news_data_articles: Option<Vec<NewsDataArticle>>,
    pub news_data_next_page: Option<String>,
    pub news_data_timestamp: Option<DateTime<Utc>>,
    pub is_news_data_error: bool,
    pub is_news_data_fetching: bool,

    pub hacker_news_articles: Option<Vec<HackerNewsArticle>>,
    pub hacker_news_timestamp: Option<DateTime<Utc>>,
    pub is_hacker_news_error: bool,
    pub is_hacker_news_fetching: bool,
}

pub struct NewsSlice<'a> {
    store: &'a Store,
}

async fn backoff(attempt: u32) {
    if attempt > 0 {
        tokio::time::sleep(NEWS_RETRY_BACKOFF * attempt).await;
    }
}

impl<'a> NewsSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Pulls up to `NEWS_DATA_FETCH_ATTEMPTS` pages starting at the stored
    /// cursor. The collected articles replace the cache.
    pub async fn fetch_news_data(&self) -> FetchOutcome {
        let cursor = self.store.update(|s| {
            let news = &mut s.news;
            if news.is_news_data_fetching {
                return None;
            }
            news.is_news_data_fetching = true;
            news.is_news_data_error = false;
            Some(news.news_data_next_page.clone())
        });
        let Some(mut cursor) = cursor else {
            debug!("fetch_news_data already in flight");
            return FetchOutcome::Skipped;
        };

        let services = self.store.services();
        let mut articles = Vec::new();

        for attempt in 0..NEWS_DATA_FETCH_ATTEMPTS {
            backoff(attempt).await;

            match services.news.news_data_page(cursor.as_deref()).await {
                Ok(page) => {
                    articles.extend(page.articles);
                    cursor = page.next_page;
                    if cursor.is_none() {
                        break;
                    }
                }
                Err(e) => warn!(
                    "fetch_news_data attempt {}: {}",
                    attempt + 1,
                    e.message().unwrap_or(DATA_ERROR)
                ),
            }
        }

        if articles.is_empty() {
            error!("fetch_news_data: no articles after {} attempts", NEWS_DATA_FETCH_ATTEMPTS);
            self.store.update(|s| {
                s.news.is_news_data_error = true;
                s.news.is_news_data_fetching = false;
            });
            return FetchOutcome::Failed;
        }

        let now = services.clock.now();
        self.store.update(|s| {
            let news = &mut s.news;
            news.news_data_articles = Some(articles);
            news.news_data_next_page = cursor;
            news.news_data_timestamp = Some(now);
            news.is_news_data_fetching = false;
        });
        FetchOutcome::Fetched
    }

    /// Hacker News has no pagination: the first non-empty batch wins.
    pub async fn fetch_hacker_news(&self) -> FetchOutcome {
        let started = self.store.update(|s| {
            let news = &mut s.news;
            if news.is_hacker_news_fetching {
                return false;
            }
            news.is_hacker_news_fetching = true;
            news.is_hacker_news_error = false;
            true
        });
        if !started {
            debug!("fetch_hacker_news already in flight");
            return FetchOutcome::Skipped;
        }

        let services = self.store.services();
        let mut articles = Vec::new();

        for attempt in 0..HACKER_NEWS_FETCH_ATTEMPTS {
            backoff(attempt).await;

            match services.news.hacker_news(HACKER_NEWS_FETCH_LIMIT).await {
                Ok(batch) if !batch.is_empty() => {
                    articles = batch;
                    break;
                }
                Ok(_) => warn!("fetch_hacker_news attempt {}: empty batch", attempt + 1),
                Err(e) => warn!(
                    "fetch_hacker_news attempt {}: {}",
                    attempt + 1,
                    e.message().unwrap_or(DATA_ERROR)
                ),
            }
        }

        if articles.is_empty() {
            error!("fetch_hacker_news: no articles after {} attempts", HACKER_NEWS_FETCH_ATTEMPTS);
            self.store.update(|s| {
                s.news.is_hacker_news_error = true;
                s.news.is_hacker_news_fetching = false;
            });
            return FetchOutcome::Failed;
        }

        let now = services.clock.now();
        self.store.update(|s| {
            let news = &mut s.news;
            news.hacker_news_articles = Some(articles);
            news.hacker_news_timestamp = Some(now);
            news.is_hacker_news_fetching = false;
        });
        FetchOutcome::Fetched
    }
}
