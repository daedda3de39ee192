//! Blob store port

use async_trait::async_trait;

use crate::domain::result::PersistError;
use crate::ports::TokenCredential;

/// Durable object storage addressed by container + blob name
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `data` to `container/blob`
    ///
    /// Conflicts follow the store's default for a plain upload, which
    /// replaces any existing blob of the same name.
    async fn upload(
        &self,
        credential: &dyn TokenCredential,
        container: &str,
        blob: &str,
        data: Vec<u8>,
    ) -> Result<(), PersistError>;
}
