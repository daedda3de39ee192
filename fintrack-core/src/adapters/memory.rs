//! In-memory adapters
//!
//! Used for dry runs (uploads are kept in memory instead of written) and as
//! test doubles for the Azure and Fio adapters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::result::{
    AuthenticationError, CredentialError, FetchError, PersistError, SecretError,
};
use crate::domain::DateRange;
use crate::ports::{
    AccessToken, BlobStore, CredentialProvider, SecretStore, TokenCredential, TransactionSource,
};

/// Credential returning a fixed token for every scope
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: Result<String, CredentialError>,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Ok(token.into()),
        }
    }

    pub fn failing(error: CredentialError) -> Self {
        Self { token: Err(error) }
    }
}

#[async_trait]
impl TokenCredential for StaticCredential {
    async fn token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
        self.token.clone().map(|token| AccessToken {
            token,
            expires_at: Instant::now() + Duration::from_secs(3600),
        })
    }
}

/// Provider handing out a [`StaticCredential`], or failing authentication
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    outcome: Result<StaticCredential, AuthenticationError>,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            outcome: Ok(StaticCredential::new(token)),
        }
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            outcome: Err(AuthenticationError::new(msg)),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn authenticate(&self) -> Result<Arc<dyn TokenCredential>, AuthenticationError> {
        let credential = self.outcome.clone()?;
        Ok(Arc::new(credential))
    }
}

/// Secret store backed by a map; unknown names are not found
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(
        &self,
        credential: &dyn TokenCredential,
        name: &str,
    ) -> Result<String, SecretError> {
        // Exercise the credential like the real store does
        credential.token("memory").await?;
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

/// Transaction source answering per token; unknown tokens get a 401
#[derive(Debug, Clone, Default)]
pub struct StaticTransactionSource {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
}

impl StaticTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, token: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(token.into(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, token: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(token.into(), Err(error));
        self
    }
}

#[async_trait]
impl TransactionSource for StaticTransactionSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, token: &str, _range: &DateRange) -> Result<Vec<u8>, FetchError> {
        self.responses.get(token).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                status: 401,
                body: "unknown token".to_string(),
            })
        })
    }
}

/// An upload kept by [`MemoryBlobStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub container: String,
    pub name: String,
    pub data: Vec<u8>,
}

/// Blob store keeping uploads in memory, in upload order
///
/// Uploading an existing name replaces it, like the real store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<Vec<StoredBlob>>,
    failure: Option<PersistError>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every upload with `error`
    pub fn failing(error: PersistError) -> Self {
        Self {
            blobs: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn blobs(&self) -> Vec<StoredBlob> {
        self.blobs.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn get(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        self.blobs()
            .into_iter()
            .find(|b| b.container == container && b.name == name)
            .map(|b| b.data)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        credential: &dyn TokenCredential,
        container: &str,
        blob: &str,
        data: Vec<u8>,
    ) -> Result<(), PersistError> {
        credential.token("memory").await?;
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| PersistError::Transport("blob store lock poisoned".to_string()))?;
        blobs.retain(|b| !(b.container == container && b.name == blob));
        blobs.push(StoredBlob {
            container: container.to_string(),
            name: blob.to_string(),
            data,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_blob_store_overwrites() {
        let store = MemoryBlobStore::new();
        let credential = StaticCredential::new("t");

        store.upload(&credential, "raw", "a/x.json", b"1".to_vec()).await.unwrap();
        store.upload(&credential, "raw", "b/x.json", b"2".to_vec()).await.unwrap();
        store.upload(&credential, "raw", "a/x.json", b"3".to_vec()).await.unwrap();

        let blobs = store.blobs();
        assert_eq!(blobs.len(), 2);
        assert_eq!(store.get("raw", "a/x.json"), Some(b"3".to_vec()));
        assert_eq!(store.get("raw", "b/x.json"), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_static_provider_failure() {
        let provider = StaticCredentialProvider::failing("no identity");
        let err = provider.authenticate().await.err().unwrap();
        assert_eq!(err.to_string(), "Authentication failed: no identity");
    }

    #[tokio::test]
    async fn test_static_secret_store() {
        let store = StaticSecretStore::new().with_secret("fio-token-a", "ta");
        let credential = StaticCredential::new("t");

        assert_eq!(store.get_secret(&credential, "fio-token-a").await.unwrap(), "ta");
        assert_eq!(
            store.get_secret(&credential, "fio-token-b").await.unwrap_err(),
            SecretError::NotFound("fio-token-b".to_string())
        );
    }
}
