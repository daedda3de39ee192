//! Fio banka REST API client
//!
//! Fetches an account's transaction history for a period:
//! `GET {base}/v1/rest/periods/{token}/{start}/{end}/transactions.json`.
//! The token identifies the account, so it ends up in the URL path and must
//! never be logged. Fio answers 409 when the same token is used again within
//! its rate-limit window; that surfaces as a status error like any other.
//!
//! API Documentation: https://www.fio.cz/docs/cz/API_Bankovnictvi.pdf

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::domain::result::FetchError;
use crate::domain::DateRange;
use crate::ports::TransactionSource;

/// Response format requested from the API
pub const FIO_FORMAT: &str = "json";

/// Fio API client
#[derive(Debug, Clone)]
pub struct FioClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    debug: bool,
}

impl FioClient {
    /// Create a client with its own connection pool
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = super::http_client(timeout)?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    /// Create a client on a shared `reqwest::Client`
    ///
    /// `timeout` must match the one the client was built with; it is only
    /// used for error messages.
    pub fn with_client(client: Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
            debug: false,
        }
    }

    /// Log each request URL (token redacted) at debug level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the period export URL
    pub fn transactions_url(&self, token: &str, range: &DateRange) -> Result<Url, FetchError> {
        let file = format!("transactions.{}", FIO_FORMAT);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("invalid API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v1",
                "rest",
                "periods",
                token,
                range.start(),
                range.end(),
                file.as_str(),
            ]);
        Ok(url)
    }

    /// Request URL with the token replaced, safe to log
    fn redacted_url(&self, range: &DateRange) -> Result<Url, FetchError> {
        self.transactions_url("REDACTED", range)
    }

    /// Map request errors to messages without the token-bearing URL
    fn map_request_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Transport(format!("request timed out after {:?}", self.timeout))
        } else if error.is_connect() {
            FetchError::Transport(format!(
                "unable to connect to {}",
                self.base_url.host_str().unwrap_or("Fio API")
            ))
        } else {
            FetchError::Transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl TransactionSource for FioClient {
    fn name(&self) -> &str {
        "fio"
    }

    async fn fetch(&self, token: &str, range: &DateRange) -> Result<Vec<u8>, FetchError> {
        let url = self.transactions_url(token, range)?;
        if self.debug {
            let redacted = self.redacted_url(range)?;
            tracing::debug!(url = %redacted, "Calling transaction API");
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Body(e.without_url().to_string()))?;
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.without_url().to_string()))?;
        Ok(body.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================
