//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Azure identity (service principal, managed identity) for CredentialProvider
//! - Azure Key Vault REST API for SecretStore
//! - Azure Blob Storage REST API for BlobStore
//! - Fio banka REST API for TransactionSource
//! - In-memory stores for dry runs and tests

use std::time::Duration;

use anyhow::Context;

pub mod azure_identity;
pub mod blob_storage;
pub mod fio;
pub mod key_vault;
pub mod memory;

#[cfg(test)]
pub mod mock_http;

/// HTTP client shared by all adapters
///
/// `timeout` bounds each whole request, connect included.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fintrack/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}
