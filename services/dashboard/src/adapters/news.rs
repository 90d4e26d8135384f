//! services/dashboard/src/adapters/news.rs
//!
//! This module implements the `NewsService` port: the NewsData.io "latest"
//! endpoint and the Hacker News Firebase API.

use async_trait::async_trait;
use dashboard_core::{
    domain::{HackerNewsArticle, NewsDataArticle, NewsDataPage},
    ports::{NewsService, PortError, PortResult},
};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const NEWS_DATA_URL: &str = "https://newsdata.io/api/1/latest";
const HACKER_NEWS_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// The API hands out at most 20 articles per request, so one port call reads
/// this many pages.
pub const NEWS_DATA_PAGE_ITERATIONS: usize = 2;

pub const NEWS_DATA_EXCLUDED_DOMAINS: &[&str] = &[
    "buffalonews.com",
    "lacrossetribune.com",
    "dailybreeze.com",
    "nptelegraph.com",
];

#[derive(Debug, Deserialize)]
struct ApiArticle {
    article_id: Option<String>,
    link: Option<String>,
    title: Option<String>,
    description: Option<String>,
    source_name: Option<String>,
    image_url: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    category: Option<Vec<String>>,
}

impl ApiArticle {
    fn to_domain(self) -> Option<NewsDataArticle> {
        Some(NewsDataArticle {
            article_id: self.article_id?,
            link: self.link?,
            title: self.title?,
            description: self.description,
            source_name: self.source_name,
            image_url: self.image_url,
            pub_date: self.pub_date,
            category: self.category.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    id: u64,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    descendants: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    dead: bool,
}

impl ApiItem {
    /// Stories without a link (Ask HN, jobs, deleted items) are dropped.
    fn to_domain(self) -> Option<HackerNewsArticle> {
        if self.deleted || self.dead {
            return None;
        }
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        Some(HackerNewsArticle {
            id: self.id,
            by: self.by.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            url: Some(url),
            score: self.score,
            time: self.time,
            descendants: self.descendants,
        })
    }
}

/// Result of decoding one NewsData.io response body.
#[derive(Debug, PartialEq)]
enum NewsDataBody {
    Page(NewsDataPage),
    /// `status` other than success or an empty result list.
    Exhausted,
}

fn parse_news_data_body(body: Value) -> PortResult<NewsDataBody> {
    let Value::Object(mut body) = body else {
        return Err(PortError::InvalidData("Malformed API response".to_string()));
    };

    let status = body
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if status == "error" {
        let message = body
            .get("results")
            .and_then(|r| r.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("API returned an unknown error");
        return Err(PortError::Unexpected(message.to_string()));
    }

    let results = match body.remove("results") {
        Some(Value::Array(results)) => results,
        _ => {
            return Err(PortError::InvalidData(
                "Invalid API response: results is not an array".to_string(),
            ))
        }
    };
    if status != "success" || results.is_empty() {
        return Ok(NewsDataBody::Exhausted);
    }

    let articles = results
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<ApiArticle>(raw) {
            Ok(article) => article.to_domain(),
            Err(e) => {
                warn!("Skipping malformed NewsData article: {}", e);
                None
            }
        })
        .collect();
    let next_page = body
        .get("nextPage")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);

    Ok(NewsDataBody::Page(NewsDataPage {
        articles,
        next_page,
    }))
}

pub struct NewsFeedAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl NewsFeedAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            timeout,
        }
    }

    async fn get_json(&self, request: reqwest::RequestBuilder) -> PortResult<Value> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "API request failed with status {}",
                response.status()
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| PortError::InvalidData(format!("Invalid JSON returned by API: {}", e)))
    }

    async fn hacker_news_item(&self, id: u64) -> Option<HackerNewsArticle> {
        let url = format!("{}/item/{}.json", HACKER_NEWS_URL, id);
        let item = self.get_json(self.client.get(url)).await.ok()?;
        serde_json::from_value::<ApiItem>(item).ok()?.to_domain()
    }
}

#[async_trait]
impl NewsService for NewsFeedAdapter {
    async fn news_data_page(&self, next_page: Option<&str>) -> PortResult<NewsDataPage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PortError::Unauthorized)?;

        let excluded = NEWS_DATA_EXCLUDED_DOMAINS.join(",");
        let mut cursor = next_page.map(str::to_string);
        let mut articles = Vec::new();

        for request in 1..=NEWS_DATA_PAGE_ITERATIONS {
            debug!(
                "NewsData request {}/{}",
                request, NEWS_DATA_PAGE_ITERATIONS
            );
            let body = {
                let mut query = vec![
                    ("apikey", api_key),
                    ("language", "en"),
                    ("category", "science,technology,entertainment"),
                    ("excludecountry", "ru,in"),
                    ("excludedomain", excluded.as_str()),
                    ("removeduplicate", "1"),
                ];
                if let Some(page) = cursor.as_deref() {
                    query.push(("page", page));
                }
                self.get_json(self.client.get(NEWS_DATA_URL).query(&query))
                    .await?
            };
            match parse_news_data_body(body)? {
                NewsDataBody::Exhausted => break,
                NewsDataBody::Page(page) => {
                    articles.extend(page.articles);
                    cursor = page.next_page;
                }
            }
            if cursor.is_none() {
                break;
            }
        }

        info!("NewsData returned {} articles", articles.len());
        Ok(NewsDataPage {
            articles,
            next_page: cursor,
        })
    }

    async fn hacker_news(&self, limit: usize) -> PortResult<Vec<HackerNewsArticle>> {
        let ids = self
            .get_json(self.client.get(format!("{}/newstories.json", HACKER_NEWS_URL)))
            .await?;
        let ids: Vec<u64> = serde_json::from_value(ids)
            .map_err(|_| PortError::InvalidData("Expected array of IDs".to_string()))?;
        debug!("Hacker News returned {} story ids", ids.len());

        // Individual item failures only shrink the batch.
        let articles: Vec<HackerNewsArticle> = join_all(
            ids.into_iter()
                .take(limit)
                .map(|id| self.hacker_news_item(id)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        info!("Hacker News returned {} articles", articles.len());
        Ok(articles)
    }
}
