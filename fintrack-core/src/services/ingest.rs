//! Ingest service - one run over every configured account

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::adapters::azure_identity::{DefaultCredentialProvider, IdentityEnvironment};
use crate::adapters::blob_storage::AzureBlobStore;
use crate::adapters::fio::FioClient;
use crate::adapters::http_client;
use crate::adapters::key_vault::KeyVaultSecretStore;
use crate::config::Config;
use crate::domain::result::AuthenticationError;
use crate::domain::DateRange;
use crate::ports::{BlobStore, Clock, CredentialProvider, SecretStore, SystemClock, TransactionSource};

use super::processor::AccountProcessor;
use super::summary::{aggregate, IngestSummary};

/// Requested period; both bounds or neither
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl IngestRequest {
    pub fn new(start_date: Option<String>, end_date: Option<String>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Build from query-string pairs (`startDate`, `endDate`)
    ///
    /// The first occurrence of a key wins; repeats and unknown keys are
    /// ignored.
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "startDate" => &mut request.start_date,
                "endDate" => &mut request.end_date,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        request
    }
}

/// Orchestrates a run: authenticate, resolve, process each account, aggregate
#[derive(Clone)]
pub struct IngestService {
    config: Arc<Config>,
    credentials: Arc<dyn CredentialProvider>,
    processor: AccountProcessor,
    clock: Arc<dyn Clock>,
}

impl IngestService {
    pub fn new(
        config: Arc<Config>,
        credentials: Arc<dyn CredentialProvider>,
        secrets: Arc<dyn SecretStore>,
        source: Arc<dyn TransactionSource>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let processor = AccountProcessor::new(secrets, source, blobs, &config.storage_container);
        Self {
            config,
            credentials,
            processor,
            clock,
        }
    }

    /// Wire up the Azure and Fio adapters from `config`
    ///
    /// All adapters share one HTTP client and its timeout. A custom blob
    /// store replaces Azure Blob Storage (used for dry runs).
    pub fn from_config(config: Arc<Config>, blobs: Option<Arc<dyn BlobStore>>) -> Result<Self> {
        let client = http_client(config.http_timeout)?;

        let credentials = Arc::new(DefaultCredentialProvider::new(
            client.clone(),
            IdentityEnvironment::from_env(),
        ));
        let secrets = Arc::new(KeyVaultSecretStore::new(
            client.clone(),
            config.key_vault_url.clone(),
        ));
        let source = Arc::new(
            FioClient::with_client(client.clone(), config.fio_api_url.clone(), config.http_timeout)
                .with_debug(config.debug),
        );
        let blobs = match blobs {
            Some(blobs) => blobs,
            None => Arc::new(AzureBlobStore::new(client, config.storage_account_url.clone())),
        };

        Ok(Self::new(
            config,
            credentials,
            secrets,
            source,
            blobs,
            Arc::new(SystemClock),
        ))
    }

    /// Run once over all accounts
    ///
    /// Only an authentication failure is returned as an error; per-account
    /// failures are part of the summary.
    pub async fn handle(&self, request: &IngestRequest) -> Result<IngestSummary, AuthenticationError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("ingest", run_id = %run_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &IngestRequest) -> Result<IngestSummary, AuthenticationError> {
        let credential = self.credentials.authenticate().await.map_err(|e| {
            tracing::error!(error = %e, "Authentication failed");
            e
        })?;

        let range = DateRange::resolve(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            self.clock.today(),
        );
        tracing::info!(
            start = range.start(),
            end = range.end(),
            accounts = self.config.accounts.len(),
            "Starting ingestion"
        );

        // Futures are lazy; buffered() starts at most `account_concurrency`
        // of them and yields results in account order
        let pending: Vec<_> = self
            .config
            .accounts
            .iter()
            .map(|account| self.processor.process(credential.as_ref(), account, &range))
            .collect();
        let results = stream::iter(pending)
            .buffered(self.config.account_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let summary = aggregate(results);
        tracing::info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            status = summary.status().http_status(),
            "Ingestion finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_request_from_query_pairs() {
        let request = IngestRequest::from_query_pairs(pairs(&[
            ("endDate", "2024-01-31"),
            ("startDate", "2024-01-01"),
            ("foo", "bar"),
        ]));
        assert_eq!(
            request,
            IngestRequest::new(Some("2024-01-01".to_string()), Some("2024-01-31".to_string()))
        );
    }

    #[test]
    fn test_request_keeps_first_repeated_value() {
        let request = IngestRequest::from_query_pairs(pairs(&[
            ("startDate", "2024-01-01"),
            ("startDate", "2024-01-02"),
            ("endDate", "2024-01-31"),
            ("endDate", "2024-02-29"),
        ]));
        assert_eq!(request.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(request.end_date.as_deref(), Some("2024-01-31"));
    }

    #[test]
    fn test_request_without_dates() {
        let request = IngestRequest::from_query_pairs(Vec::<(String, String)>::new());
        assert_eq!(request, IngestRequest::default());
    }
}
