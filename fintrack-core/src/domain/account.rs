//! Account alias domain model and naming conventions

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DateRange;

/// Alias used when the configured list is empty after filtering
pub const DEFAULT_ACCOUNT_ALIAS: &str = "invoices";

/// Prefix of the secret holding an account's API token
pub const SECRET_NAME_PREFIX: &str = "fio-token-";

/// Logical account identifier (e.g. "invoices", "savings")
///
/// Selects the token secret and the blob prefix for one ingestion run.
/// Always non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAlias(String);

impl AccountAlias {
    /// Create an alias, returning None for blank input
    pub fn new(alias: impl AsRef<str>) -> Option<Self> {
        let trimmed = alias.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountAlias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a comma-separated alias list
///
/// Entries are trimmed and blanks dropped. Order is kept and duplicates are
/// not removed; each occurrence is processed on its own. An empty result
/// falls back to [`DEFAULT_ACCOUNT_ALIAS`], so the returned set is never empty.
pub fn parse_account_aliases(raw: &str) -> Vec<AccountAlias> {
    let aliases: Vec<AccountAlias> = raw.split(',').filter_map(AccountAlias::new).collect();

    if aliases.is_empty() {
        vec![AccountAlias(DEFAULT_ACCOUNT_ALIAS.to_string())]
    } else {
        aliases
    }
}

/// Name of the secret holding the API token for `account`
pub fn secret_name_for(account: &AccountAlias) -> String {
    format!("{}{}", SECRET_NAME_PREFIX, account)
}

/// Blob path for an account's export of `range`
///
/// `<account>/transactions_<start>_<end>.json`
pub fn blob_name_for(account: &AccountAlias, range: &DateRange) -> String {
    format!(
        "{}/transactions_{}_{}.json",
        account,
        range.start(),
        range.end()
    )
}
