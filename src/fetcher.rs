use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::SearchConfig;
use crate::controller::{Completion, FetchRequest};
use crate::model::ResultPage;

pub const PARAM_SEARCH: &str = "query";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_HPP: &str = "hitsPerPage";

/// Anything that went wrong between issuing a request and holding a decoded
/// page: network, non-2xx status or a payload that does not parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::new(format!("search service returned {status}"))
        } else if err.is_decode() {
            Self::new(format!("malformed search response: {err}"))
        } else {
            Self::new(format!("request failed: {err}"))
        }
    }
}

/// Source of result pages.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        key: &str,
        page: u32,
        hits_per_page: u32,
    ) -> Result<ResultPage, FetchError>;
}

/// Fetcher backed by the Algolia Hacker News search endpoint.
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    pub fn new(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        key: &str,
        page: u32,
        hits_per_page: u32,
    ) -> Result<ResultPage, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                (PARAM_SEARCH, key.to_string()),
                (PARAM_PAGE, page.to_string()),
                (PARAM_HPP, hits_per_page.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<ResultPage>().await?)
    }
}

/// Runs `request` on the runtime and reports the outcome on `completions`.
/// The request's liveness token rides along untouched; it is checked by the
/// receiver, not here.
pub fn spawn_fetch(
    fetcher: Arc<dyn Fetcher>,
    request: FetchRequest,
    completions: UnboundedSender<Completion>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let FetchRequest {
            key,
            page,
            hits_per_page,
            token,
        } = request;
        let outcome = fetcher.fetch(&key, page, hits_per_page).await;
        if completions
            .send(Completion {
                token,
                key,
                page,
                outcome,
            })
            .is_err()
        {
            debug!("Completion channel closed; dropping fetch result");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> HttpFetcher {
        let config = SearchConfig {
            base_url: server.uri(),
            ..SearchConfig::default()
        };
        HttpFetcher::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_fetch_sends_wire_parameters() {
        let mock_server = MockServer::start().await;

        let response_json = r#"{
            "hits": [
                {"objectID": "1", "title": "A", "author": "dan", "points": 5, "num_comments": 2}
            ],
            "page": 3,
            "nbPages": 10
        }"#;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "react hooks"))
            .and(query_param("page", "3"))
            .and(query_param("hitsPerPage", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = fetcher_for(&mock_server)
            .fetch("react hooks", 3, 100)
            .await
            .unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].id, "1");
        assert_eq!(page.hits[0].title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let err = fetcher_for(&mock_server)
            .fetch("react", 0, 100)
            .await
            .unwrap_err();

        assert!(err.message().contains("503"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results": []}"#))
            .mount(&mock_server)
            .await;

        let err = fetcher_for(&mock_server)
            .fetch("react", 0, 100)
            .await
            .unwrap_err();

        assert!(err.message().starts_with("malformed search response"));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_error() {
        let config = SearchConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..SearchConfig::default()
        };
        let fetcher = HttpFetcher::new(Client::new(), &config);

        let err = fetcher.fetch("react", 0, 100).await.unwrap_err();

        assert!(err.message().starts_with("request failed"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = SearchConfig {
            base_url: "https://hn.algolia.com/api/v1/".to_string(),
            ..SearchConfig::default()
        };
        let fetcher = HttpFetcher::new(Client::new(), &config);

        assert_eq!(fetcher.endpoint(), "https://hn.algolia.com/api/v1/search");
    }
}
