//! Ambient identity port
//!
//! A [`CredentialProvider`] is asked once per request for a
//! [`TokenCredential`]. The credential then hands out bearer tokens for
//! each downstream resource (Key Vault, Blob Storage).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::domain::result::{AuthenticationError, CredentialError};

/// Bearer token for one scope
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

// Keep the token itself out of debug output
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Get a token for `scope` (e.g. "https://vault.azure.net/.default")
    async fn token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// Ambient credential mechanism
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Establish the identity for one request
    ///
    /// Failure here aborts the whole request.
    async fn authenticate(&self) -> Result<Arc<dyn TokenCredential>, AuthenticationError>;
}
