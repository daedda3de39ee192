//! Fintrack Core - transaction ingestion for Fio bank accounts
//!
//! This crate implements the core logic following hexagonal architecture:
//!
//! - **domain**: Core entities (AccountAlias, DateRange, AccountResult) and errors
//! - **ports**: Trait definitions for external dependencies (SecretStore, TransactionSource, BlobStore)
//! - **services**: Per-account processing, run orchestration, aggregation
//! - **adapters**: Concrete implementations (Azure identity, Key Vault, Blob Storage, Fio)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use config::{Config, ConfigWarning};
pub use domain::result::{AccountError, AuthenticationError, Stage};
pub use domain::{AccountAlias, AccountResult, DateRange};
pub use services::{IngestRequest, IngestService, IngestSummary, OverallStatus};
