use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::holds::{Branch, DroppedHold, EnrichError};
use crate::ils::IlsError;
use crate::report::{EmitSummary, ReportError};

/// Errors that end processing of one branch.
///
/// Messages carry their cause, so none is exposed as `source()`.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error("ILS login failed: {0}")]
    Authentication(IlsError),

    #[error("Pull list fetch failed: {0}")]
    PullList(IlsError),

    #[error("Enrichment aborted: {0}")]
    Enrichment(EnrichError),

    #[error("Report output failed: {0}")]
    Report(ReportError),
}

/// Errors that end the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Branch {branch} failed: {error}")]
    Branch { branch: String, error: BranchError },

    #[error("ILS login failed: {0}")]
    Authentication(IlsError),
}

/// Counters for one completed branch.
#[derive(Debug, Clone, Serialize)]
pub struct BranchStats {
    pub branch: Branch,
    pub elapsed: Duration,
    /// Request attempts made for this branch, retries and login included.
    pub requests: u64,
    /// Holds dropped after a failed lookup.
    pub errors: usize,
    /// Rows written across both partitions.
    pub rows: usize,
    pub dropped: Vec<DroppedHold>,
    pub report: EmitSummary,
}

/// A branch skipped after a failure.
#[derive(Debug, Clone, Serialize)]
pub struct BranchFailure {
    pub branch: Branch,
    pub error: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Configured request concurrency limit.
    pub max_concurrent: usize,
    pub branches: Vec<BranchStats>,
    pub failures: Vec<BranchFailure>,
    /// Request attempts made during the run, retries included.
    pub requests: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.branches.iter().map(|b| b.rows).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.branches.iter().map(|b| b.errors).sum()
    }

    /// True when no branch failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
