//! HTTP transaction source
//!
//! `GET <base>?page=<N>&limit=<M>[&category=<c>][&search=<s>]` returning a JSON
//! array of transaction records. Timeouts and connection handling are left to
//! the reqwest client passed in.

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::request::PageRequest;
use crate::TransactionSource;
use txscope_core::{CoreError, CoreResult, Page};

/// reqwest-backed transaction endpoint client
#[derive(Debug, Clone)]
pub struct HttpTransactionSource {
    http_client: HttpClient,
    base_url: String,
}

impl HttpTransactionSource {
    /// Create a new client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(HttpClient::new(), base_url)
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(http_client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TransactionSource for HttpTransactionSource {
    async fn get_page(&self, request: &PageRequest) -> CoreResult<Page> {
        let url = request.to_url(&self.base_url)?;
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::network(format!("Failed to fetch transactions: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            log::warn!("Transactions endpoint answered {} for page {}", status, request.page);
            return Err(CoreError::network(format!("Failed to fetch transactions: {}", reason)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::network(format!("Failed to read transactions: {}", e)))?;

        parse_page(&body)
    }
}

/// Decode a response body into a page
pub fn parse_page(body: &str) -> CoreResult<Page> {
    serde_json::from_str(body).map_err(|e| CoreError::InvalidFormat {
        message: format!("Unexpected transactions payload: {}", e),
    })
}
