//! Per-account outcome of one ingestion run

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::result::AccountError;
use super::AccountAlias;

/// Outcome of processing one account
///
/// `success` is true iff the secret lookup, the fetch and the upload all
/// succeeded. Built once by the processor and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResult {
    account: AccountAlias,
    success: bool,
    message: Option<String>,
    error: Option<AccountError>,
}

impl AccountResult {
    /// Create a successful result
    pub fn succeeded(account: AccountAlias, message: impl Into<String>) -> Self {
        Self {
            account,
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Create a failed result
    pub fn failed(account: AccountAlias, error: impl Into<AccountError>) -> Self {
        Self {
            account,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn account(&self) -> &AccountAlias {
        &self.account
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&AccountError> {
        self.error.as_ref()
    }

    /// "success" or "failed"
    pub fn status_label(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "failed"
        }
    }
}

/// Serialized as `{account, status, message, error}`
///
/// `message` and `error` are always strings, empty when absent, so existing
/// consumers of the response body keep working.
impl Serialize for AccountResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let error = self.error.as_ref().map(|e| e.to_string()).unwrap_or_default();

        let mut state = serializer.serialize_struct("AccountResult", 4)?;
        state.serialize_field("account", self.account.as_str())?;
        state.serialize_field("status", self.status_label())?;
        state.serialize_field("message", self.message.as_deref().unwrap_or(""))?;
        state.serialize_field("error", &error)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::SecretError;

    fn alias(name: &str) -> AccountAlias {
        AccountAlias::new(name).unwrap()
    }

    #[test]
    fn test_success_serialization() {
        let result = AccountResult::succeeded(alias("invoices"), "Blob uploaded successfully");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "account": "invoices",
                "status": "success",
                "message": "Blob uploaded successfully",
                "error": ""
            })
        );
    }

    #[test]
    fn test_failure_serialization() {
        let result = AccountResult::failed(
            alias("savings"),
            SecretError::NotFound("fio-token-savings".to_string()),
        );
        assert!(!result.is_success());
        assert!(result.message().is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "");
        assert_eq!(
            json["error"],
            "failed to retrieve token: secret 'fio-token-savings' not found"
        );
    }
}
