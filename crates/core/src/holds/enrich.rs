//! Dependent-record resolution for pull-list holds.
//!
//! Each hold needs up to five lookups. They form two independent chains that
//! run concurrently:
//!
//! ```text
//! hold record ──┬── patron
//!               └── bib
//! item ──────────── call
//! ```
//!
//! All holds of a branch are resolved concurrently; the [`RequestGate`] is
//! what bounds the number of requests actually in flight.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::config::EnrichmentFailurePolicy;
use crate::gate::RequestGate;
use crate::ils::{IlsApi, IlsError, Record};
use crate::metrics;

use super::types::{
    BibDetail, CallDetail, DroppedHold, EnrichError, HoldChain, HoldDetail, ItemDetail,
    LookupStage, PatronDetail, ResolvedHold,
};

/// Result of enriching one branch's pull list.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    /// Holds with every lookup satisfied, in completion order.
    pub resolved: Vec<ResolvedHold>,
    /// Holds left out after a failed lookup.
    pub dropped: Vec<DroppedHold>,
    /// Holds that needed no lookup at all.
    pub already_complete: usize,
}

/// Resolves the records each hold depends on.
pub struct EnrichmentOrchestrator {
    api: Arc<dyn IlsApi>,
    gate: Arc<RequestGate>,
    policy: EnrichmentFailurePolicy,
}

type HoldSide = (HoldDetail, Option<BibDetail>, Option<PatronDetail>);
type ItemSide = (ItemDetail, CallDetail);

impl EnrichmentOrchestrator {
    pub fn new(api: Arc<dyn IlsApi>, gate: Arc<RequestGate>, policy: EnrichmentFailurePolicy) -> Self {
        Self { api, gate, policy }
    }

    /// Resolve every chain.
    ///
    /// With [`EnrichmentFailurePolicy::DropRecord`] a failed hold is recorded
    /// in [`EnrichmentOutcome::dropped`] and the rest continue. With
    /// [`EnrichmentFailurePolicy::AbortBranch`] the first failure is returned
    /// and outstanding lookups are cancelled.
    pub async fn enrich(
        &self,
        session: &Session,
        chains: Vec<HoldChain>,
    ) -> Result<EnrichmentOutcome, EnrichError> {
        let mut outcome = EnrichmentOutcome::default();
        let mut pending = Vec::new();

        for chain in chains {
            if chain.is_complete() {
                if let Some(hold) = chain.into_resolved() {
                    outcome.resolved.push(hold);
                    outcome.already_complete += 1;
                }
            } else {
                pending.push(chain);
            }
        }

        debug!(
            complete = outcome.already_complete,
            pending = pending.len(),
            "Enriching pull list"
        );

        let mut in_progress: FuturesUnordered<_> = pending
            .into_iter()
            .map(|chain| self.resolve(session, chain))
            .collect();

        while let Some(result) = in_progress.next().await {
            match result {
                Ok(hold) => outcome.resolved.push(hold),
                Err(error) => match self.policy {
                    EnrichmentFailurePolicy::DropRecord => {
                        warn!(
                            hold_key = %error.hold_key,
                            stage = %error.stage,
                            error = %error.source,
                            "Dropping hold from report"
                        );
                        metrics::HOLDS_DROPPED
                            .with_label_values(&[error.stage.as_str()])
                            .inc();
                        outcome.dropped.push(DroppedHold::from(&error));
                    }
                    EnrichmentFailurePolicy::AbortBranch => return Err(error),
                },
            }
        }

        Ok(outcome)
    }

    async fn resolve(&self, session: &Session, chain: HoldChain) -> Result<ResolvedHold, EnrichError> {
        let HoldChain {
            position,
            hold_key,
            item_key,
            hold,
            item,
            call,
            bib,
            patron,
        } = chain;

        let ((hold, bib, _patron), (item, call)) = tokio::try_join!(
            self.resolve_hold_side(session, &hold_key, hold, bib, patron),
            self.resolve_item_side(session, &hold_key, &item_key, item, call),
        )?;

        // The hold record names the bib for title holds; otherwise the call does.
        let bib = match bib {
            Some(bib) => bib,
            None => match call.bib_key.as_deref() {
                Some(bib_key) => self.lookup_bib(session, &hold_key, bib_key).await?,
                None => {
                    return Err(EnrichError::new(
                        &hold_key,
                        LookupStage::Bib,
                        IlsError::missing_field("holdRecord", &hold_key, "bib"),
                    ))
                }
            },
        };

        Ok(ResolvedHold::assemble(position, hold_key, hold, item, call, bib))
    }

    async fn resolve_hold_side(
        &self,
        session: &Session,
        hold_key: &str,
        hold: Option<HoldDetail>,
        bib: Option<BibDetail>,
        patron: Option<PatronDetail>,
    ) -> Result<HoldSide, EnrichError> {
        let hold = match hold {
            Some(hold) => hold,
            None => {
                self.lookup(
                    hold_key,
                    LookupStage::HoldRecord,
                    hold_key,
                    || self.api.hold_record(session, hold_key),
                    HoldDetail::from_record,
                )
                .await?
            }
        };

        let bib_lookup = async {
            match (bib, hold.bib_key.as_deref()) {
                (Some(bib), _) => Ok(Some(bib)),
                (None, Some(bib_key)) => self.lookup_bib(session, hold_key, bib_key).await.map(Some),
                (None, None) => Ok(None),
            }
        };

        let patron_lookup = async {
            match (patron, hold.patron_key.as_deref()) {
                (Some(patron), _) => Ok(Some(patron)),
                (None, Some(patron_key)) => self
                    .lookup(
                        hold_key,
                        LookupStage::Patron,
                        patron_key,
                        || self.api.patron(session, patron_key),
                        PatronDetail::from_record,
                    )
                    .await
                    .map(Some),
                (None, None) => Ok(None),
            }
        };

        let (bib, patron) = tokio::try_join!(bib_lookup, patron_lookup)?;
        Ok((hold, bib, patron))
    }

    async fn resolve_item_side(
        &self,
        session: &Session,
        hold_key: &str,
        item_key: &str,
        item: Option<ItemDetail>,
        call: Option<CallDetail>,
    ) -> Result<ItemSide, EnrichError> {
        let item = match item {
            Some(item) => item,
            None => {
                self.lookup(
                    hold_key,
                    LookupStage::Item,
                    item_key,
                    || self.api.item(session, item_key),
                    ItemDetail::from_record,
                )
                .await?
            }
        };

        let call = match call {
            Some(call) => call,
            None => {
                let call_key = item.call_key.clone().unwrap_or_default();
                self.lookup(
                    hold_key,
                    LookupStage::Call,
                    &call_key,
                    || self.api.call(session, &call_key),
                    CallDetail::from_record,
                )
                .await?
            }
        };

        Ok((item, call))
    }

    async fn lookup_bib(&self, session: &Session, hold_key: &str, bib_key: &str) -> Result<BibDetail, EnrichError> {
        self.lookup(
            hold_key,
            LookupStage::Bib,
            bib_key,
            || self.api.bib(session, bib_key),
            BibDetail::from_record,
        )
        .await
    }

    /// One gated lookup, converted to its detail type.
    async fn lookup<F, Fut, R, D>(
        &self,
        hold_key: &str,
        stage: LookupStage,
        key: &str,
        fetch: F,
        detail: fn(&Record<R>) -> Result<D, IlsError>,
    ) -> Result<D, EnrichError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Record<R>, IlsError>>,
    {
        let result = async {
            if key.is_empty() {
                return Err(IlsError::missing_field(stage.resource(), hold_key, "key"));
            }
            let record = self.gate.call(stage.as_str(), fetch).await?;
            detail(&record)
        }
        .await;

        result.map_err(|source| EnrichError::new(hold_key, stage, source))
    }
}
