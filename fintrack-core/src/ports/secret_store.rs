//! Secret store port

use async_trait::async_trait;

use crate::domain::result::SecretError;
use crate::ports::TokenCredential;

/// Named credential lookup (Azure Key Vault in production)
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of secret `name`
    ///
    /// No caching: every call is a fresh lookup.
    async fn get_secret(
        &self,
        credential: &dyn TokenCredential,
        name: &str,
    ) -> Result<String, SecretError>;
}
