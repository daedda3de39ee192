//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The services
//! depend only on these traits, not on the Azure or Fio adapters.

mod blob_store;
mod clock;
mod credential;
mod secret_store;
mod transaction_source;

pub use blob_store::BlobStore;
pub use clock::{Clock, FixedClock, SystemClock};
pub use credential::{AccessToken, CredentialProvider, TokenCredential};
pub use secret_store::SecretStore;
pub use transaction_source::TransactionSource;
