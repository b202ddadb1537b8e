use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

use regsearch_core::{BackendConfig, Error, FetchRequest, Fetcher, Method, RawResponse, Result};

/// `Fetcher` over a shared `reqwest::Client`. Transport only: no retries, and
/// timeouts are the client's unless the backend config sets them.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self { Self::default() }

    pub fn with_client(client: Client) -> Self { Self { client } }

    pub fn from_backend(backend: &BackendConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ms) = backend.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = backend.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let mut http = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            http = http.query(&request.query);
        }
        if let Some(body) = &request.body {
            http = http.json(body);
        }

        tracing::debug!(method = ?request.method, url = %request.url, query = ?request.query, "requesting");
        let response = http.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(network_error)?;
        tracing::debug!(status, bytes = body.len(), "response received");

        Ok(RawResponse { status, body: body.to_vec() })
    }
}

fn network_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        Error::Network(format!("failed to connect: {}", e))
    } else {
        Error::Network(format!("request failed: {}", e))
    }
}
