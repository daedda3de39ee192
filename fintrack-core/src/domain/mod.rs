//! Core domain entities
//!
//! Pure data structures and naming rules - no I/O or external dependencies.

mod account;
mod date_range;
mod outcome;
pub mod result;

pub use account::{
    blob_name_for, parse_account_aliases, secret_name_for, AccountAlias, DEFAULT_ACCOUNT_ALIAS,
};
pub use date_range::{DateRange, DATE_FORMAT};
pub use outcome::AccountResult;
