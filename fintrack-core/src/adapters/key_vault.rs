//! Azure Key Vault secret store
//!
//! `GET {vault}/secrets/{name}?api-version=7.4` with a bearer token for the
//! Key Vault resource. Returns the latest version of the secret.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::domain::result::SecretError;
use crate::ports::{SecretStore, TokenCredential};

pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const KEY_VAULT_API_VERSION: &str = "7.4";

/// Secret bundle as returned by Key Vault (only what we read)
#[derive(Debug, Deserialize)]
struct SecretBundle {
    #[serde(default)]
    value: Option<String>,
}

/// Key Vault client
#[derive(Debug, Clone)]
pub struct KeyVaultSecretStore {
    client: Client,
    vault_url: Url,
}

impl KeyVaultSecretStore {
    pub fn new(client: Client, vault_url: Url) -> Self {
        Self { client, vault_url }
    }

    fn secret_url(&self, name: &str) -> Result<Url, SecretError> {
        let mut url = self.vault_url.clone();
        url.path_segments_mut()
            .map_err(|_| SecretError::Transport(format!("invalid vault URL: {}", self.vault_url)))?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut()
            .append_pair("api-version", KEY_VAULT_API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    async fn get_secret(
        &self,
        credential: &dyn TokenCredential,
        name: &str,
    ) -> Result<String, SecretError> {
        let token = credential.token(KEY_VAULT_SCOPE).await?;
        let url = self.secret_url(name)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| SecretError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let bundle: SecretBundle = response
                    .json()
                    .await
                    .map_err(|e| SecretError::Transport(format!("invalid secret response: {}", e)))?;
                bundle
                    .value
                    .ok_or_else(|| SecretError::MissingValue(name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(SecretError::NotFound(name.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SecretError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
