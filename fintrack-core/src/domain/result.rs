//! Error types for the core library
//!
//! Only [`AuthenticationError`] is request-scoped. Everything else is caught
//! at the account boundary and ends up inside a failed [`AccountResult`].
//!
//! [`AccountResult`]: crate::domain::AccountResult

use thiserror::Error;

/// The ambient identity could not be established for a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed: {0}")]
pub struct AuthenticationError(pub String);

impl AuthenticationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure while acquiring an access token for a downstream service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token request failed: {0}")]
    Transport(String),

    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Secret store failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("secret request failed: {0}")]
    Transport(String),

    #[error("secret store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("secret '{0}' not found")]
    NotFound(String),

    #[error("secret '{0}' has no value")]
    MissingValue(String),
}

/// Transaction API failure
///
/// A non-2xx answer is not a network error: the status and body are kept
/// so the caller can see what the provider said.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to call API: {0}")]
    Transport(String),

    #[error("API returned non-200 status: {status}, Response: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read API response: {0}")]
    Body(String),
}

/// Blob store failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to upload blob: {0}")]
    Transport(String),

    #[error("blob store returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Stage of the per-account pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Secret,
    Fetch,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Secret => "secret",
            Stage::Fetch => "fetch",
            Stage::Persist => "persist",
        }
    }
}

/// Account-scoped failure, tagged with the stage that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("failed to retrieve token: {0}")]
    SecretRetrieval(#[source] SecretError),

    #[error("failed to fetch data: {0}")]
    Fetch(#[source] FetchError),

    #[error("failed to write blob: {0}")]
    Persist(#[source] PersistError),
}

impl AccountError {
    pub fn stage(&self) -> Stage {
        match self {
            AccountError::SecretRetrieval(_) => Stage::Secret,
            AccountError::Fetch(_) => Stage::Fetch,
            AccountError::Persist(_) => Stage::Persist,
        }
    }
}

impl From<SecretError> for AccountError {
    fn from(e: SecretError) -> Self {
        Self::SecretRetrieval(e)
    }
}

impl From<FetchError> for AccountError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<PersistError> for AccountError {
    fn from(e: PersistError) -> Self {
        Self::Persist(e)
    }
}
