//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions.

mod ingest;
mod processor;
mod summary;

pub use ingest::{IngestRequest, IngestService};
pub use processor::{AccountProcessor, SUCCESS_MESSAGE};
pub use summary::{aggregate, IngestSummary, OverallStatus};
