//! Elasticsearch HTTP transport
//!
//! Implements [`SearchBackend`] by POSTing the search body to
//! `<url>/<index>/_search`.

mod error;

use std::time::Duration;

use async_trait::async_trait;
use esagg_core::{
    BackendError, BackendResult, CheckConfig, SearchBackend, SearchRequest, SearchResponse,
};
use tracing::{debug, trace};

use crate::error::{classify, truncate_body};

/// Elasticsearch connection settings
#[derive(Debug, Clone)]
pub struct EsConfig {
    /// Base URL, e.g. `http://localhost:9200`
    pub url: String,
    /// Deadline for one search round trip
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for EsConfig {
    fn default() -> Self {
        EsConfig {
            url: esagg_core::config::DEFAULT_ES_URL.to_string(),
            timeout: esagg_core::config::DEFAULT_TIMEOUT,
            user_agent: format!("check-es-aggregation/{}", esagg_core::VERSION),
        }
    }
}

impl EsConfig {
    /// Create config for a specific server
    pub fn new(url: &str) -> Self {
        EsConfig {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Take URL and deadline from a check configuration
    pub fn from_check(config: &CheckConfig) -> Self {
        Self::new(&config.es_url).with_timeout(config.timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Search client for one Elasticsearch endpoint
pub struct EsClient {
    config: EsConfig,
    http_client: reqwest::Client,
}

impl EsClient {
    /// Create a new client
    pub fn new(config: EsConfig) -> BackendResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(EsClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &EsConfig {
        &self.config
    }

    /// `_search` URL for an index pattern
    pub fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.config.url.trim_end_matches('/'), index)
    }
}

#[async_trait]
impl SearchBackend for EsClient {
    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchResponse> {
        let url = self.search_url(&request.index);
        debug!(url = %url, "POST _search");
        trace!(body = %request.body, "search body");

        let response = self
            .http_client
            .post(&url)
            .query(&[("ignore_unavailable", "true")])
            .json(&request.body)
            .send()
            .await
            .map_err(|e| classify(e, self.config.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify(e, self.config.timeout))?;
        debug!(status = status.as_u16(), bytes = text.len(), "search response");
        trace!(body = %text, "search response body");

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn endpoint(&self) -> &str {
        &self.config.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_es_config_default() {
        let config = EsConfig::default();
        assert_eq!(config.url, "http://localhost:9200");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("check-es-aggregation/"));
    }

    #[test]
    fn test_es_config_from_check() {
        let mut check = CheckConfig::new("dur", "15", "30");
        check.es_url = "http://es.internal:9200".to_string();
        check.timeout = Duration::from_secs(3);
        let config = EsConfig::from_check(&check);
        assert_eq!(config.url, "http://es.internal:9200");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        let client = EsClient::new(EsConfig::new("http://localhost:9200/")).unwrap();
        assert_eq!(
            client.search_url("logstash-*"),
            "http://localhost:9200/logstash-*/_search"
        );
        assert_eq!(client.endpoint(), "http://localhost:9200/");
    }
}
