//! Per-branch control flow.
//!
//! Branches are processed one after another, in configuration order:
//! authenticate, fetch the pull list, enrich, aggregate, sort, emit.

mod types;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::auth::{Credentials, Session, SessionAuthenticator};
use crate::config::{BranchFailurePolicy, PipelineConfig, SessionPolicy};
use crate::gate::RequestGate;
use crate::holds::{
    aggregate, sort_rows, Branch, DroppedHold, EnrichmentOrchestrator, PullListFetcher,
};
use crate::ils::IlsApi;
use crate::metrics;
use crate::report::{EmitSummary, ReportEmitter};

pub use types::{BranchError, BranchFailure, BranchStats, RunError, RunSummary};

/// Runs the pipeline for each configured branch.
pub struct BranchRunner {
    authenticator: SessionAuthenticator,
    fetcher: PullListFetcher,
    orchestrator: EnrichmentOrchestrator,
    emitter: Arc<dyn ReportEmitter>,
    gate: Arc<RequestGate>,
    credentials: Credentials,
    pipeline: PipelineConfig,
}

impl BranchRunner {
    pub fn new(
        api: Arc<dyn IlsApi>,
        gate: Arc<RequestGate>,
        emitter: Arc<dyn ReportEmitter>,
        credentials: Credentials,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            authenticator: SessionAuthenticator::new(Arc::clone(&api), Arc::clone(&gate)),
            fetcher: PullListFetcher::new(
                Arc::clone(&api),
                Arc::clone(&gate),
                pipeline.pull_list_mode,
            ),
            orchestrator: EnrichmentOrchestrator::new(
                api,
                Arc::clone(&gate),
                pipeline.enrichment_failure,
            ),
            emitter,
            gate,
            credentials,
            pipeline,
        }
    }

    /// Process every branch in order.
    ///
    /// Under [`BranchFailurePolicy::AbortRun`] the first branch failure is
    /// returned. Under [`BranchFailurePolicy::SkipBranch`] failures are
    /// collected in the summary and the remaining branches still run.
    pub async fn run(&self, branches: &[Branch]) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let attempts_before = self.gate.stats().attempts;

        let shared_session = match self.pipeline.session_policy {
            SessionPolicy::Shared => Some(
                self.authenticator
                    .login(&self.credentials)
                    .await
                    .map_err(RunError::Authentication)?,
            ),
            SessionPolicy::PerBranch => None,
        };

        let mut summary = RunSummary {
            max_concurrent: self.gate.max_concurrent(),
            ..RunSummary::default()
        };

        for branch in branches {
            match self.run_branch(shared_session.as_ref(), branch).await {
                Ok(stats) => summary.branches.push(stats),
                Err(e) => {
                    error!(branch = %branch.key, error = %e, "Branch failed");
                    match self.pipeline.branch_failure {
                        BranchFailurePolicy::AbortRun => {
                            return Err(RunError::Branch {
                                branch: branch.key.clone(),
                                error: e,
                            })
                        }
                        BranchFailurePolicy::SkipBranch => summary.failures.push(BranchFailure {
                            branch: branch.clone(),
                            error: e.to_string(),
                        }),
                    }
                }
            }
        }

        summary.requests = self.gate.stats().attempts - attempts_before;
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Process one branch. A shared session is used when given, otherwise a
    /// fresh one is obtained.
    pub async fn run_branch(
        &self,
        shared_session: Option<&Session>,
        branch: &Branch,
    ) -> Result<BranchStats, BranchError> {
        let started = Instant::now();
        let attempts_before = self.gate.stats().attempts;
        info!(branch = %branch.key, name = %branch.name, "Processing branch");

        let result = self.process(shared_session, branch).await;

        let elapsed = started.elapsed();
        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::BRANCH_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        let (dropped, report) = result?;
        let stats = BranchStats {
            branch: branch.clone(),
            elapsed,
            requests: self.gate.stats().attempts - attempts_before,
            errors: dropped.len(),
            rows: report.total_rows(),
            dropped,
            report,
        };

        info!(
            branch = %branch.key,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            requests = stats.requests,
            errors = stats.errors,
            rows = stats.rows,
            "Branch complete"
        );

        Ok(stats)
    }

    async fn process(
        &self,
        shared_session: Option<&Session>,
        branch: &Branch,
    ) -> Result<(Vec<DroppedHold>, EmitSummary), BranchError> {
        let session = match shared_session {
            Some(session) => {
                debug!(
                    branch = %branch.key,
                    issued_at = %session.issued_at(),
                    "Reusing shared session"
                );
                session.clone()
            }
            None => self
                .authenticator
                .login(&self.credentials)
                .await
                .map_err(BranchError::Authentication)?,
        };

        let chains = self
            .fetcher
            .fetch(&session, branch)
            .await
            .map_err(BranchError::PullList)?;

        let outcome = self
            .orchestrator
            .enrich(&session, chains)
            .await
            .map_err(BranchError::Enrichment)?;

        let mut rows = aggregate(outcome.resolved);
        sort_rows(&mut rows, &self.pipeline.sort_order);

        let report = self
            .emitter
            .emit(branch, &rows)
            .await
            .map_err(BranchError::Report)?;

        Ok((outcome.dropped, report))
    }
}
