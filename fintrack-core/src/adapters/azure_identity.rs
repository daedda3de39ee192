//! Azure ambient identity
//!
//! Picks the first configured credential source, in this order:
//! 1. Service principal with client secret (`AZURE_TENANT_ID`,
//!    `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`)
//! 2. App Service / Container Apps managed identity (`IDENTITY_ENDPOINT`,
//!    `IDENTITY_HEADER`)
//! 3. Instance Metadata Service managed identity, user-assigned when
//!    `AZURE_CLIENT_ID` is set
//!
//! The environment is captured once at startup. Each request authenticates
//! into a fresh [`AzureCredential`] whose token cache lives as long as the
//! request does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{AuthenticationError, CredentialError};
use crate::ports::{AccessToken, CredentialProvider, TokenCredential};

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Tokens this close to expiry are refreshed
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Upper bound on a token lifetime taken from a response
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);

/// Timeout for the first IMDS request; off Azure nothing answers there
pub const DEFAULT_IMDS_INITIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Identity-related environment, captured once
#[derive(Debug, Clone, Default)]
pub struct IdentityEnvironment {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authority_host: Option<String>,
    pub identity_endpoint: Option<String>,
    pub identity_header: Option<String>,
    pub imds_endpoint: Option<String>,
}

impl IdentityEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            tenant_id: get("AZURE_TENANT_ID"),
            client_id: get("AZURE_CLIENT_ID"),
            client_secret: get("AZURE_CLIENT_SECRET"),
            authority_host: get("AZURE_AUTHORITY_HOST"),
            identity_endpoint: get("IDENTITY_ENDPOINT"),
            identity_header: get("IDENTITY_HEADER"),
            imds_endpoint: get("AZURE_POD_IDENTITY_AUTHORITY_HOST")
                .map(|host| format!("{}/metadata/identity/oauth2/token", host.trim_end_matches('/'))),
        }
    }

    /// Name of the credential source this environment selects
    pub fn source_name(&self) -> &'static str {
        if self.tenant_id.is_some() || self.client_secret.is_some() {
            "client_secret"
        } else if self.identity_endpoint.is_some() {
            "app_service_managed_identity"
        } else {
            "imds_managed_identity"
        }
    }
}

/// Where tokens come from
#[derive(Debug, Clone)]
enum TokenSource {
    ClientSecret {
        token_url: Url,
        client_id: String,
        client_secret: String,
    },
    AppService {
        endpoint: Url,
        header: String,
        client_id: Option<String>,
    },
    Imds {
        endpoint: Url,
        client_id: Option<String>,
    },
}

/// Credential provider for the Azure ambient identity
#[derive(Debug, Clone)]
pub struct DefaultCredentialProvider {
    client: Client,
    env: IdentityEnvironment,
    imds_initial_timeout: Duration,
}

impl DefaultCredentialProvider {
    pub fn new(client: Client, env: IdentityEnvironment) -> Self {
        Self {
            client,
            env,
            imds_initial_timeout: DEFAULT_IMDS_INITIAL_TIMEOUT,
        }
    }

    pub fn with_imds_initial_timeout(mut self, timeout: Duration) -> Self {
        self.imds_initial_timeout = timeout;
        self
    }

    fn select_source(&self) -> Result<TokenSource, AuthenticationError> {
        let env = &self.env;

        if env.tenant_id.is_some() || env.client_secret.is_some() {
            let missing: Vec<&str> = [
                ("AZURE_TENANT_ID", env.tenant_id.is_none()),
                ("AZURE_CLIENT_ID", env.client_id.is_none()),
                ("AZURE_CLIENT_SECRET", env.client_secret.is_none()),
            ]
            .iter()
            .filter(|(_, is_missing)| *is_missing)
            .map(|(key, _)| *key)
            .collect();

            return match (&env.tenant_id, &env.client_id, &env.client_secret) {
                (Some(tenant), Some(client_id), Some(secret)) => {
                    let authority = env.authority_host.as_deref().unwrap_or(DEFAULT_AUTHORITY_HOST);
                    let token_url = parse_endpoint(&format!(
                        "{}/{}/oauth2/v2.0/token",
                        authority.trim_end_matches('/'),
                        tenant
                    ))?;
                    Ok(TokenSource::ClientSecret {
                        token_url,
                        client_id: client_id.clone(),
                        client_secret: secret.clone(),
                    })
                }
                _ => Err(AuthenticationError::new(format!(
                    "incomplete service principal configuration, missing {}",
                    missing.join(", ")
                ))),
            };
        }

        if let Some(endpoint) = &env.identity_endpoint {
            let header = env.identity_header.clone().ok_or_else(|| {
                AuthenticationError::new("IDENTITY_ENDPOINT is set but IDENTITY_HEADER is not")
            })?;
            return Ok(TokenSource::AppService {
                endpoint: parse_endpoint(endpoint)?,
                header,
                client_id: env.client_id.clone(),
            });
        }

        let endpoint = env.imds_endpoint.as_deref().unwrap_or(DEFAULT_IMDS_ENDPOINT);
        Ok(TokenSource::Imds {
            endpoint: parse_endpoint(endpoint)?,
            client_id: env.client_id.clone(),
        })
    }
}

fn parse_endpoint(value: &str) -> Result<Url, AuthenticationError> {
    Url::parse(value)
        .map_err(|e| AuthenticationError::new(format!("invalid identity endpoint {}: {}", value, e)))
}

#[async_trait]
impl CredentialProvider for DefaultCredentialProvider {
    async fn authenticate(&self) -> Result<Arc<dyn TokenCredential>, AuthenticationError> {
        let source = self.select_source()?;
        tracing::debug!(source = self.env.source_name(), "Selected credential source");
        Ok(Arc::new(AzureCredential {
            client: self.client.clone(),
            source,
            cache: Mutex::new(HashMap::new()),
            imds_initial_timeout: self.imds_initial_timeout,
            imds_reached: AtomicBool::new(false),
            imds_unavailable: Mutex::new(None),
        }))
    }
}

/// Token response; managed identity endpoints send numbers as strings
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<JsonValue>,
    #[serde(default)]
    expires_on: Option<JsonValue>,
}

impl TokenResponse {
    fn lifetime(&self) -> Option<Duration> {
        if let Some(secs) = self.expires_in.as_ref().and_then(json_u64) {
            return Some(Duration::from_secs(secs));
        }
        let expires_on = self.expires_on.as_ref().and_then(json_u64)?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        Some(Duration::from_secs(expires_on.saturating_sub(now)))
    }
}

/// Expiry instant for a token valid for `lifetime`, capped
fn expiry_after(lifetime: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(lifetime.min(MAX_TOKEN_LIFETIME))
        .unwrap_or(now)
}

fn json_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Managed identity endpoints take a resource, not a scope
fn resource_for(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

/// Token source with a per-scope cache
///
/// Until IMDS has answered once, its requests use the short initial timeout.
/// A transport failure there marks IMDS unavailable for the rest of this
/// credential's life, so later scopes fail without waiting again.
pub struct AzureCredential {
    client: Client,
    source: TokenSource,
    cache: Mutex<HashMap<String, AccessToken>>,
    imds_initial_timeout: Duration,
    imds_reached: AtomicBool,
    imds_unavailable: Mutex<Option<String>>,
}

impl AzureCredential {
    fn cached(&self, scope: &str) -> Option<AccessToken> {
        let cache = self.cache.lock().ok()?;
        let token = cache.get(scope)?;
        (token.expires_at > Instant::now() + EXPIRY_MARGIN).then(|| token.clone())
    }

    fn imds_unavailable(&self) -> Option<String> {
        self.imds_unavailable.lock().ok()?.clone()
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let request = match &self.source {
            TokenSource::ClientSecret {
                token_url,
                client_id,
                client_secret,
            } => self.client.post(token_url.clone()).form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", scope),
            ]),
            TokenSource::AppService {
                endpoint,
                header,
                client_id,
            } => {
                let mut query = vec![
                    ("api-version", APP_SERVICE_API_VERSION),
                    ("resource", resource_for(scope)),
                ];
                if let Some(id) = client_id {
                    query.push(("client_id", id.as_str()));
                }
                self.client
                    .get(endpoint.clone())
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
            }
            TokenSource::Imds {
                endpoint,
                client_id,
            } => {
                let mut query = vec![
                    ("api-version", IMDS_API_VERSION),
                    ("resource", resource_for(scope)),
                ];
                if let Some(id) = client_id {
                    query.push(("client_id", id.as_str()));
                }
                let request = self
                    .client
                    .get(endpoint.clone())
                    .query(&query)
                    .header("Metadata", "true");
                if self.imds_reached.load(Ordering::SeqCst) {
                    request
                } else {
                    request.timeout(self.imds_initial_timeout)
                }
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let msg = e.to_string();
                if matches!(self.source, TokenSource::Imds { .. }) {
                    tracing::debug!(error = %msg, "Managed identity endpoint unreachable");
                    if let Ok(mut unavailable) = self.imds_unavailable.lock() {
                        *unavailable = Some(msg.clone());
                    }
                }
                return Err(CredentialError::Transport(msg));
            }
        };
        if matches!(self.source, TokenSource::Imds { .. }) {
            self.imds_reached.store(true, Ordering::SeqCst);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;
        let lifetime = parsed.lifetime().ok_or_else(|| {
            CredentialError::InvalidResponse("token response has no expiry".to_string())
        })?;

        Ok(AccessToken {
            token: parsed.access_token,
            expires_at: expiry_after(lifetime),
        })
    }
}

#[async_trait]
impl TokenCredential for AzureCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        if let Some(token) = self.cached(scope) {
            return Ok(token);
        }
        if let Some(msg) = self.imds_unavailable() {
            return Err(CredentialError::Transport(format!(
                "managed identity endpoint unavailable: {}",
                msg
            )));
        }

        let token = self.request_token(scope).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(scope.to_string(), token.clone());
        }
        Ok(token)
    }
}
