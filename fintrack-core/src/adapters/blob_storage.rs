//! Azure Blob Storage uploader
//!
//! Single-shot Put Blob of a block blob: `PUT {account}/{container}/{blob}`.
//! Put Blob replaces an existing blob of the same name, which is the
//! overwrite behaviour re-runs of the same period rely on.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use url::Url;

use crate::domain::result::PersistError;
use crate::ports::{BlobStore, TokenCredential};

pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
const STORAGE_API_VERSION: &str = "2021-08-06";

/// Blob Storage client for one storage account
#[derive(Debug, Clone)]
pub struct AzureBlobStore {
    client: Client,
    account_url: Url,
}

impl AzureBlobStore {
    pub fn new(client: Client, account_url: Url) -> Self {
        Self {
            client,
            account_url,
        }
    }

    /// URL of `container/blob`; "/" in the blob name stays a path separator
    pub fn blob_url(&self, container: &str, blob: &str) -> Result<Url, PersistError> {
        let mut url = self.account_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PersistError::Transport(format!("invalid storage URL: {}", self.account_url))
            })?
            .pop_if_empty()
            .push(container)
            .extend(blob.split('/'));
        Ok(url)
    }
}

fn content_type_for(blob: &str) -> &'static str {
    if blob.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn upload(
        &self,
        credential: &dyn TokenCredential,
        container: &str,
        blob: &str,
        data: Vec<u8>,
    ) -> Result<(), PersistError> {
        let token = credential.token(STORAGE_SCOPE).await?;
        let url = self.blob_url(container, blob)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let response = self
            .client
            .put(url)
            .bearer_auth(&token.token)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-date", date)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type_for(blob))
            .body(data)
            .send()
            .await
            .map_err(|e| PersistError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PersistError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StaticCredential;
    use crate::adapters::mock_http::{MockHttpServer, MockResponse};

    #[test]
    fn test_blob_url_keeps_virtual_directories() {
        let store = AzureBlobStore::new(
            Client::new(),
            Url::parse("https://safintrackdev.blob.core.windows.net/").unwrap(),
        );
        let url = store
            .blob_url("raw", "invoices/transactions_2024-03-01_2024-03-01.json")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://safintrackdev.blob.core.windows.net/raw/invoices/transactions_2024-03-01_2024-03-01.json"
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("a/transactions.json"), "application/json");
        assert_eq!(content_type_for("a/export.xml"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_puts_block_blob() {
        let server = MockHttpServer::builder()
            .route("PUT", "/raw/", MockResponse::new(201, ""))
            .start()
            .unwrap();

        let store = AzureBlobStore::new(Client::new(), server.url());
        let credential = StaticCredential::new("storage-token");
        store
            .upload(
                &credential,
                "raw",
                "invoices/transactions_2024-03-01_2024-03-01.json",
                b"{\"ok\":true}".to_vec(),
            )
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "PUT");
        assert_eq!(
            request.path(),
            "/raw/invoices/transactions_2024-03-01_2024-03-01.json"
        );
        assert_eq!(request.header("x-ms-blob-type"), Some("BlockBlob"));
        assert_eq!(request.header("x-ms-version"), Some(STORAGE_API_VERSION));
        assert!(request.header("x-ms-date").is_some());
        assert_eq!(request.header("authorization"), Some("Bearer storage-token"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body, b"{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_status() {
        let server = MockHttpServer::builder()
            .route("PUT", "/", MockResponse::new(403, "AuthorizationPermissionMismatch"))
            .start()
            .unwrap();

        let store = AzureBlobStore::new(Client::new(), server.url());
        let credential = StaticCredential::new("storage-token");
        let err = store
            .upload(&credential, "raw", "a/b.json", Vec::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PersistError::Status {
                status: 403,
                body: "AuthorizationPermissionMismatch".to_string()
            }
        );
    }
}
