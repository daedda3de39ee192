//! Run summary - per-account results folded into one outcome

use serde::Serialize;

use crate::domain::AccountResult;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Succeeded,
    Partial,
    Failed,
}

impl OverallStatus {
    /// HTTP status code reported for this outcome
    pub fn http_status(&self) -> u16 {
        match self {
            OverallStatus::Succeeded => 200,
            OverallStatus::Partial => 206,
            OverallStatus::Failed => 500,
        }
    }
}

/// Summary of one run, serialized as the response body
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<AccountResult>,
}

impl IngestSummary {
    pub fn status(&self) -> OverallStatus {
        if self.succeeded == 0 {
            OverallStatus::Failed
        } else if self.succeeded < self.processed {
            OverallStatus::Partial
        } else {
            OverallStatus::Succeeded
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.status() == OverallStatus::Succeeded
    }
}

/// Count results, keeping their order
pub fn aggregate(results: Vec<AccountResult>) -> IngestSummary {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    IngestSummary {
        processed: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        results,
    }
}
