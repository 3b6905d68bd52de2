use super::{RestClient, RestRequest, RestResponse};
use crate::config::RestConfig;
use crate::util::{ResolutionError, Result, SourceError};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// reqwest-backed client. Relative request paths are joined onto the
/// configured base url; configured headers go on every request.
#[derive(Debug, Clone)]
pub struct HttpRestClient {
    client: Client,
    base_url: Option<String>,
    headers: IndexMap<String, String>,
    timeout_ms: u64,
}

impl HttpRestClient {
    pub fn new(config: &RestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ResolutionError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.as_ref().map(|u| u.trim_end_matches('/').to_string()),
            headers: config.headers.clone().into_iter().collect(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match &self.base_url {
            Some(base) if path.starts_with('/') => format!("{base}{path}"),
            Some(base) => format!("{base}/{path}"),
            None => path.to_string(),
        }
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    async fn exchange(&self, request: RestRequest) -> Result<RestResponse, SourceError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|_| SourceError::Transport(format!("invalid http verb ({})", request.method)))?;
        let url = self.url_for(&request.url);
        debug!(%method, %url, "rest request");

        let mut builder = self.client.request(method, &url);
        for (name, value) in self.headers.iter().chain(request.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout_ms)
            } else {
                SourceError::Transport(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(RestResponse { status, body })
    }
}
