//! Transaction history provider port

use async_trait::async_trait;

use crate::domain::result::FetchError;
use crate::domain::DateRange;

/// External API returning an account's transactions for a period
///
/// Implementations return the raw response body; nothing is parsed here
/// because the payload is stored as-is.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Provider name (e.g., "fio")
    fn name(&self) -> &str;

    /// Fetch transactions for the account identified by `token`
    async fn fetch(&self, token: &str, range: &DateRange) -> Result<Vec<u8>, FetchError>;
}
