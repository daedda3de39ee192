//! Account processor - one account through secret, fetch and upload

use std::sync::Arc;

use crate::domain::result::AccountError;
use crate::domain::{blob_name_for, secret_name_for, AccountAlias, AccountResult, DateRange};
use crate::ports::{BlobStore, SecretStore, TokenCredential, TransactionSource};

/// Message on a successful account
pub const SUCCESS_MESSAGE: &str = "Blob uploaded successfully";

/// Runs the per-account pipeline
///
/// Each stage short-circuits: a failed secret lookup skips the fetch and
/// the upload for that account. Errors never escape; they end up in the
/// returned [`AccountResult`].
#[derive(Clone)]
pub struct AccountProcessor {
    secrets: Arc<dyn SecretStore>,
    source: Arc<dyn TransactionSource>,
    blobs: Arc<dyn BlobStore>,
    container: String,
}

impl AccountProcessor {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        source: Arc<dyn TransactionSource>,
        blobs: Arc<dyn BlobStore>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            secrets,
            source,
            blobs,
            container: container.into(),
        }
    }

    /// Process one account for `range`
    pub async fn process(
        &self,
        credential: &dyn TokenCredential,
        account: &AccountAlias,
        range: &DateRange,
    ) -> AccountResult {
        match self.run(credential, account, range).await {
            Ok(()) => {
                tracing::info!(account = %account, "Account processed");
                AccountResult::succeeded(account.clone(), SUCCESS_MESSAGE)
            }
            Err(e) => {
                tracing::error!(account = %account, stage = e.stage().as_str(), error = %e, "Account failed");
                AccountResult::failed(account.clone(), e)
            }
        }
    }

    async fn run(
        &self,
        credential: &dyn TokenCredential,
        account: &AccountAlias,
        range: &DateRange,
    ) -> Result<(), AccountError> {
        let secret = secret_name_for(account);
        tracing::debug!(account = %account, secret = %secret, "Retrieving API token");
        let token = self.secrets.get_secret(credential, &secret).await?;

        tracing::debug!(
            account = %account,
            source = self.source.name(),
            start = range.start(),
            end = range.end(),
            "Fetching transactions"
        );
        let data = self.source.fetch(&token, range).await?;

        let blob = blob_name_for(account, range);
        tracing::debug!(account = %account, blob = %blob, bytes = data.len(), "Uploading blob");
        self.blobs
            .upload(credential, &self.container, &blob, data)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        MemoryBlobStore, StaticCredential, StaticSecretStore, StaticTransactionSource,
    };
    use crate::domain::result::{FetchError, PersistError, SecretError, Stage};

    fn alias(name: &str) -> AccountAlias {
        AccountAlias::new(name).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new("2024-03-01", "2024-03-01")
    }

    fn processor(
        secrets: StaticSecretStore,
        source: StaticTransactionSource,
        blobs: Arc<MemoryBlobStore>,
    ) -> AccountProcessor {
        AccountProcessor::new(Arc::new(secrets), Arc::new(source), blobs, "raw")
    }

    #[tokio::test]
    async fn test_success_uploads_payload() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let p = processor(
            StaticSecretStore::new().with_secret("fio-token-invoices", "tok"),
            StaticTransactionSource::new().with_response("tok", "{\"a\":1}"),
            blobs.clone(),
        );

        let result = p
            .process(&StaticCredential::new("c"), &alias("invoices"), &range())
            .await;

        assert!(result.is_success());
        assert_eq!(result.message(), Some(SUCCESS_MESSAGE));
        assert_eq!(
            blobs.get("raw", "invoices/transactions_2024-03-01_2024-03-01.json"),
            Some(b"{\"a\":1}".to_vec())
        );
    }

    #[tokio::test]
    async fn test_secret_failure_skips_fetch_and_upload() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let p = processor(
            StaticSecretStore::new(),
            StaticTransactionSource::new().with_response("tok", "{}"),
            blobs.clone(),
        );

        let result = p
            .process(&StaticCredential::new("c"), &alias("savings"), &range())
            .await;

        assert!(!result.is_success());
        assert_eq!(
            result.error(),
            Some(&AccountError::SecretRetrieval(SecretError::NotFound(
                "fio-token-savings".to_string()
            )))
        );
        assert!(blobs.blobs().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_upload() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let p = processor(
            StaticSecretStore::new().with_secret("fio-token-a", "tok"),
            StaticTransactionSource::new().with_error(
                "tok",
                FetchError::Status {
                    status: 503,
                    body: "down".to_string(),
                },
            ),
            blobs.clone(),
        );

        let result = p
            .process(&StaticCredential::new("c"), &alias("a"), &range())
            .await;

        let error = result.error().unwrap();
        assert_eq!(error.stage(), Stage::Fetch);
        assert!(error.to_string().starts_with("failed to fetch data: "));
        assert!(blobs.blobs().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let blobs = Arc::new(MemoryBlobStore::failing(PersistError::Status {
            status: 403,
            body: "denied".to_string(),
        }));
        let p = processor(
            StaticSecretStore::new().with_secret("fio-token-a", "tok"),
            StaticTransactionSource::new().with_response("tok", "{}"),
            blobs,
        );

        let result = p
            .process(&StaticCredential::new("c"), &alias("a"), &range())
            .await;

        assert_eq!(result.error().map(|e| e.stage()), Some(Stage::Persist));
        assert!(result.message().is_none());
    }
}
