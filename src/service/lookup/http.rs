//! HTTP implementation of [`GenericLookupClient`].
//!
//! Talks to the DuckDuckGo instant answer API, Reddit's public user endpoint, and a
//! JSON package search API. The package API is expected to answer
//! `GET <endpoint>/search?q=`, `GET <endpoint>/rdeps?q=` and `GET <endpoint>/latest`
//! with an array of `{"name": .., "description": ..}` objects.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    error::FetchError,
    types::{PackageRecord, Res, SearchAnswer, SearchTopic, TemperatureUnit},
};

use super::{GenericLookupClient, LookupClient, units};

/// Most of a page read when fetching it; titles live near the top.
pub const MAX_PAGE_BYTES: usize = 64 * 1024;

// Extra methods on `LookupClient` applied by the HTTP implementation.

impl LookupClient {
    pub fn http(config: &Config) -> Res<Self> {
        let client = HttpLookupClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }
}

// Wire types.

/// A DuckDuckGo related topic; either a plain topic or a named group of topics.
#[derive(Debug, Default, Deserialize)]
struct DdgTopic {
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "Topics", default)]
    topics: Vec<SearchTopic>,
}

#[derive(Debug, Default, Deserialize)]
struct DdgResponse {
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<DdgTopic>,
    #[serde(rename = "Results", default)]
    results: Vec<SearchTopic>,
    #[serde(rename = "Redirect", default)]
    redirect: String,
}

impl From<DdgResponse> for SearchAnswer {
    fn from(response: DdgResponse) -> Self {
        let related_topics = response
            .related_topics
            .into_iter()
            .flat_map(|topic| {
                if topic.first_url.is_empty() {
                    topic.topics
                } else {
                    vec![SearchTopic {
                        first_url: topic.first_url,
                        text: topic.text,
                    }]
                }
            })
            .filter(|topic| !topic.first_url.is_empty())
            .collect();

        Self {
            related_topics,
            results: response.results,
            redirect: response.redirect,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RedditAbout {
    data: Option<RedditUser>,
}

#[derive(Debug, Deserialize)]
struct RedditUser {
    name: String,
    created_utc: f64,
}

// Structs.

/// HTTP lookup client implementation.
#[derive(Clone)]
pub struct HttpLookupClient {
    client: reqwest::Client,
    config: Config,
}

impl HttpLookupClient {
    /// Create a new HTTP lookup client.
    #[instrument(name = "HttpLookupClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("chanbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config: config.clone() })
    }

    async fn get_packages(&self, path: &str, query: &str) -> Res<Vec<PackageRecord>> {
        let url = format!("{}/{}", self.config.packages_endpoint.trim_end_matches('/'), path);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(&[("q", query)]);
        }

        let packages = request.send().await?.error_for_status()?.json::<Vec<PackageRecord>>().await?;
        debug!("{} returned {} packages", url, packages.len());

        Ok(packages)
    }
}

#[async_trait]
impl GenericLookupClient for HttpLookupClient {
    #[instrument(skip(self))]
    async fn cakeday(&self, user: &str) -> Res<String> {
        let url = format!("{}/user/{}/about.json", self.config.reddit_endpoint.trim_end_matches('/'), user);

        let about = self.client.get(&url).send().await?.error_for_status()?.json::<RedditAbout>().await?;
        let user = about.data.ok_or(anyhow::anyhow!("no such user: {}", user))?;

        let created = chrono::DateTime::<chrono::Utc>::from_timestamp(user.created_utc as i64, 0).ok_or(anyhow::anyhow!("invalid creation time for {}", user.name))?;

        Ok(format!("{}'s cakeday is {} (since {})", user.name, created.format("%B %-d"), created.format("%Y")))
    }

    #[instrument(skip(self))]
    async fn web_search(&self, query: &str) -> Res<SearchAnswer> {
        let body = self
            .client
            .get(&self.config.search_endpoint)
            .query(&[("q", query), ("format", "json"), ("no_html", "1"), ("no_redirect", "1")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let response = serde_json::from_str::<DdgResponse>(&body)?;

        Ok(response.into())
    }

    fn convert_temperature(&self, value: f64, unit: TemperatureUnit) -> String {
        units::convert_temperature(value, unit)
    }

    #[instrument(skip(self))]
    async fn search_packages(&self, query: &str) -> Res<Vec<PackageRecord>> {
        if query.is_empty() {
            self.get_packages("latest", "").await
        } else {
            self.get_packages("search", query).await
        }
    }

    #[instrument(skip(self))]
    async fn reverse_dependencies(&self, package: &str) -> Res<Vec<PackageRecord>> {
        self.get_packages("rdeps", package).await
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self.client.get(url).send().await.map_err(|err| FetchError::Unreachable {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        let mut body = Vec::new();

        loop {
            let chunk = response.chunk().await.map_err(|err| FetchError::UnreadableBody {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

            let Some(chunk) = chunk else {
                break;
            };

            body.extend_from_slice(&chunk);

            if body.len() >= MAX_PAGE_BYTES {
                debug!("Stopped reading {} after {} bytes", url, MAX_PAGE_BYTES);
                body.truncate(MAX_PAGE_BYTES);
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

// Tests.
