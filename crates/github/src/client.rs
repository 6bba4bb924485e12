//! REST client for the parts of the GitHub API the census reads.
//!
//! All requests are single-page (`per_page=100`); pagination is not followed.
//! Retryable failures (timeouts, connection errors, 429, 5xx) are re-issued
//! with exponential back-off up to `max_retries` times.

use std::time::Duration;

use async_trait::async_trait;
use census::{
    Card, CardId, Column, ColumnId, Label, LabelCatalog, LabelId, LabelName, Project,
    ProjectBoard, ProjectId, RepositoryId, RetryPolicy, TrackerError,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::error::{status_error, transport_error, ClientError};
use crate::models::{
    CardPayload, ColumnPayload, ErrorPayload, IssuePayload, LabelPayload, ProjectPayload,
};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest page GitHub serves; only the first page is read.
const PER_PAGE: u32 = 100;

// Classic projects are still served under the inertia preview media type.
const PROJECTS_MEDIA_TYPE: &str = "application/vnd.github.inertia-preview+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

// Exponential backoff constant
const BACKOFF_MULTIPLIER: u32 = 2;

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base URL, e.g. `https://api.github.com` or a GitHub Enterprise
    /// `https://github.example.com/api/v3`.
    pub api_url: String,
    /// Personal access token sent as a bearer token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,
    /// Back-off before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Upper bound on issue fetches in flight while listing one column.
    pub max_concurrent_requests: usize,
    /// `User-Agent` header value (GitHub rejects requests without one).
    pub user_agent: String,
}

impl GithubConfig {
    /// Creates a configuration for the public API with default limits.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            max_concurrent_requests: 4,
            user_agent: concat!("size-census/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GitHub implementation of [`ProjectBoard`] and [`LabelCatalog`].
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    max_retries: u32,
    retry_delay: Duration,
    max_concurrent_requests: usize,
}

impl GithubClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the token cannot be used as a header, the
    /// API URL is empty, or the HTTP client cannot be constructed.
    pub fn new(config: &GithubConfig) -> Result<Self, ClientError> {
        let api_url = config.api_url.trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(ClientError::MissingApiUrl);
        }

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::InvalidToken)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(header::ACCEPT, HeaderValue::from_static(PROJECTS_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        })
    }

    /// GETs `url` and decodes the JSON body, retrying retryable failures.
    async fn get_json<T: DeserializeOwned>(&self, resource: &str, url: &str) -> Result<T, TrackerError> {
        let mut attempt: u32 = 0;
        loop {
            let error = match self.get_json_once(resource, url).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            match error.retry_policy() {
                RetryPolicy::Retryable { after } if attempt < self.max_retries => {
                    let delay = after.unwrap_or_else(|| backoff_delay(self.retry_delay, attempt));
                    warn!(
                        resource,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "Retrying GitHub request"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                _ => return Err(error),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        resource: &str,
        url: &str,
    ) -> Result<T, TrackerError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(resource, &e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| transport_error(resource, &e));
        }

        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let message = match response.json::<ErrorPayload>().await {
            Ok(payload) => payload.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(status_error(resource, status.as_u16(), message, retry_after_secs))
    }

    /// Builds a card snapshot, reading the labels of the issue behind it.
    ///
    /// Note cards have no labels. When the issue cannot be read (404: deleted,
    /// or outside what the token can see) the card is marked with its missing
    /// content URL so the run can report it.
    async fn read_card(&self, card: CardPayload, column: ColumnId) -> Result<Card, TrackerError> {
        let id = CardId::new(card.id);
        let Some(content_url) = card.content_url else {
            return Ok(Card::new(id, column, Vec::new()));
        };
        let resource = format!("issue of card {}", card.id);
        match self.get_json::<IssuePayload>(&resource, &content_url).await {
            Ok(issue) => Ok(Card::new(
                id,
                column,
                issue
                    .labels
                    .into_iter()
                    .filter_map(|label| LabelName::new(label.name))
                    .collect(),
            )),
            Err(error) if error.is_not_found() => {
                debug!(card = card.id, content_url = %content_url, "Card content not found");
                Ok(Card::with_missing_content(id, column, content_url))
            }
            Err(error) => Err(error),
        }
    }
}

/// Delay before retry number `attempt + 1`, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(BACKOFF_MULTIPLIER.saturating_pow(attempt))
        .unwrap_or(Duration::MAX)
}

#[async_trait]
impl ProjectBoard for GithubClient {
    #[instrument(skip_all, fields(repository = %repository))]
    async fn list_projects(&self, repository: &RepositoryId) -> Result<Vec<Project>, TrackerError> {
        let url = format!(
            "{}/repos/{}/{}/projects?per_page={PER_PAGE}",
            self.api_url,
            repository.owner(),
            repository.repo()
        );
        let payload: Vec<ProjectPayload> = self
            .get_json(&format!("projects of {repository}"), &url)
            .await?;
        Ok(payload
            .into_iter()
            .map(|p| Project {
                id: ProjectId::new(p.id),
                name: p.name,
            })
            .collect())
    }

    #[instrument(skip_all, fields(project = %project))]
    async fn list_project_columns(&self, project: ProjectId) -> Result<Vec<Column>, TrackerError> {
        let url = format!(
            "{}/projects/{project}/columns?per_page={PER_PAGE}",
            self.api_url
        );
        let payload: Vec<ColumnPayload> = self
            .get_json(&format!("columns of project {project}"), &url)
            .await?;
        Ok(payload
            .into_iter()
            .map(|c| Column::new(ColumnId::new(c.id), c.name))
            .collect())
    }

    #[instrument(skip_all, fields(column = %column))]
    async fn list_project_cards(&self, column: ColumnId) -> Result<Vec<Card>, TrackerError> {
        let url = format!(
            "{}/projects/columns/{column}/cards?per_page={PER_PAGE}",
            self.api_url
        );
        let payload: Vec<CardPayload> = self
            .get_json(&format!("cards of column {column}"), &url)
            .await?;

        stream::iter(payload)
            .map(|card| self.read_card(card, column))
            .buffered(self.max_concurrent_requests)
            .try_collect()
            .await
    }
}

#[async_trait]
impl LabelCatalog for GithubClient {
    #[instrument(skip_all, fields(repository = %repository, label = %name))]
    async fn get_label(
        &self,
        repository: &RepositoryId,
        name: &LabelName,
    ) -> Result<Label, TrackerError> {
        let url = format!(
            "{}/repos/{}/{}/labels/{}",
            self.api_url,
            repository.owner(),
            repository.repo(),
            urlencoding::encode(name.as_str())
        );
        let payload: LabelPayload = self
            .get_json(&format!("label '{name}' in {repository}"), &url)
            .await?;
        let canonical = LabelName::new(payload.name).ok_or_else(|| TrackerError::Decode {
            message: format!("label '{name}' came back with an empty name"),
        })?;
        Ok(Label {
            id: LabelId::new(payload.id),
            name: canonical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let mut config = GithubConfig::new("t0ken");
        config.api_url = "https://github.example.com/api/v3/".into();
        let client = GithubClient::new(&config).unwrap();
        assert_eq!(client.api_url, "https://github.example.com/api/v3");
    }

    #[test]
    fn test_empty_api_url_is_rejected() {
        let mut config = GithubConfig::new("t0ken");
        config.api_url = "/".into();
        assert!(matches!(
            GithubClient::new(&config),
            Err(ClientError::MissingApiUrl)
        ));
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let config = GithubConfig::new("abc\ndef");
        assert!(matches!(
            GithubClient::new(&config),
            Err(ClientError::InvalidToken)
        ));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(Duration::from_secs(u64::MAX), 1), Duration::MAX);
        assert_eq!(backoff_delay(Duration::from_secs(u64::MAX / 2), 2), Duration::MAX);
        assert_eq!(
            backoff_delay(Duration::from_millis(1), 40),
            Duration::from_millis(u64::from(u32::MAX))
        );
    }

    #[test]
    fn test_zero_concurrency_is_raised_to_one() {
        let mut config = GithubConfig::new("t0ken");
        config.max_concurrent_requests = 0;
        let client = GithubClient::new(&config).unwrap();
        assert_eq!(client.max_concurrent_requests, 1);
    }
}
