//! Pull-list retrieval and normalization.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::Session;
use crate::config::PullListMode;
use crate::gate::RequestGate;
use crate::ils::{IlsApi, IlsError, PullListEntryFields, Record};

use super::types::{BibDetail, Branch, CallDetail, HoldChain, HoldDetail, ItemDetail};

/// Fetches a branch's hold pull list.
pub struct PullListFetcher {
    api: Arc<dyn IlsApi>,
    gate: Arc<RequestGate>,
    mode: PullListMode,
}

impl PullListFetcher {
    pub fn new(api: Arc<dyn IlsApi>, gate: Arc<RequestGate>, mode: PullListMode) -> Self {
        Self { api, gate, mode }
    }

    /// Fetch the pull list for `branch`, in server order.
    ///
    /// A response without a field bag is treated as an empty pull list.
    pub async fn fetch(&self, session: &Session, branch: &Branch) -> Result<Vec<HoldChain>, IlsError> {
        let record = self
            .gate
            .call("pull_list", || {
                self.api.hold_item_pull_list(session, &branch.key, self.mode)
            })
            .await?;

        let entries = record.fields.map(|f| f.pull_list).unwrap_or_default();
        let chains: Vec<HoldChain> = entries
            .into_iter()
            .enumerate()
            .map(|(position, entry)| normalize_entry(position, entry))
            .collect();

        let complete = chains.iter().filter(|c| c.is_complete()).count();
        info!(
            branch = %branch.key,
            entries = chains.len(),
            complete = complete,
            mode = ?self.mode,
            "Pull list fetched"
        );

        Ok(chains)
    }
}

/// Convert one pull-list entry into a [`HoldChain`].
///
/// Embedded records that are missing required fields are discarded so the
/// enrichment stage looks them up instead.
pub fn normalize_entry(position: usize, entry: Record<PullListEntryFields>) -> HoldChain {
    let Some(fields) = entry.fields else {
        debug!(position = position, "Pull list entry without fields");
        return HoldChain::keys_only(position, "", "");
    };

    let hold_record = fields.hold_record;
    let item_record = fields.item;

    let mut chain = HoldChain::keys_only(position, hold_record.key.clone(), item_record.key.clone());

    if hold_record.fields.is_some() {
        chain.hold = HoldDetail::from_record(&hold_record).ok();
    }

    if item_record.fields.is_some() {
        chain.item = ItemDetail::from_record(&item_record).ok();

        let call_record = item_record.fields.as_ref().and_then(|f| f.call.as_ref());
        if let Some(call_record) = call_record.filter(|c| c.fields.is_some()) {
            chain.call = CallDetail::from_record(call_record).ok();

            let bib_record = call_record.fields.as_ref().and_then(|f| f.bib.as_ref());
            if let Some(bib_record) = bib_record.filter(|b| b.fields.is_some()) {
                chain.bib = BibDetail::from_record(bib_record).ok();
            }
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holds::HoldType;
    use crate::ils::{BibFields, CallFields, HoldRecordFields, ItemFields, LocationFields};
    use crate::testing::{fixtures, MockIls};
    use crate::config::GateConfig;

    fn thick_entry(hold_key: &str, hold_type: &str) -> Record<PullListEntryFields> {
        Record::new(
            "",
            PullListEntryFields {
                hold_record: Record::new(
                    hold_key,
                    HoldRecordFields {
                        hold_type: Some(hold_type.to_string()),
                        status: Some("PLACED".to_string()),
                        bib: None,
                        patron: None,
                    },
                ),
                item: Record::new(
                    "55:1:1",
                    ItemFields {
                        barcode: Some("3123".to_string()),
                        call: Some(Record::new(
                            "55:1",
                            CallFields {
                                call_number: Some("FIC SMI".to_string()),
                                volumetric: None,
                                bib: Some(Record::new(
                                    "55",
                                    BibFields {
                                        title: Some("White Teeth".to_string()),
                                        author: Some("Smith, Zadie".to_string()),
                                        title_control_number: Some("a123".to_string()),
                                    },
                                )),
                            },
                        )),
                        current_location: Some(Record::new(
                            "STACKS",
                            LocationFields {
                                description: Some("Adult stacks".to_string()),
                            },
                        )),
                    },
                ),
            },
        )
    }

    #[test]
    fn test_thick_entry_is_complete() {
        let chain = normalize_entry(4, thick_entry("1001", "COPY"));
        assert_eq!(chain.position, 4);
        assert_eq!(chain.hold_key, "1001");
        assert_eq!(chain.item_key, "55:1:1");
        assert!(chain.is_complete());
        assert_eq!(chain.hold.as_ref().unwrap().hold_type, HoldType::Copy);
        assert_eq!(chain.bib.as_ref().unwrap().title, "White Teeth");
    }

    #[test]
    fn test_thin_entry_has_keys_only() {
        let entry = Record::new(
            "",
            PullListEntryFields {
                hold_record: Record::key_only("1001"),
                item: Record::key_only("55:1:1"),
            },
        );
        let chain = normalize_entry(0, entry);
        assert_eq!(chain, HoldChain::keys_only(0, "1001", "55:1:1"));
        assert!(!chain.is_complete());
    }

    #[test]
    fn test_unusable_embedded_hold_is_discarded() {
        let chain = normalize_entry(0, thick_entry("1001", "SYSTEM"));
        assert!(chain.hold.is_none());
        assert!(chain.item.is_some());
        assert!(!chain.is_complete());
    }

    #[test]
    fn test_entry_without_fields() {
        let chain = normalize_entry(2, Record::key_only(""));
        assert_eq!(chain, HoldChain::keys_only(2, "", ""));
    }

    #[tokio::test]
    async fn test_fetch_preserves_server_order() {
        let ils = Arc::new(MockIls::new());
        ils.add_thin_pull_list("CEN", &["3", "1", "2"]).await;
        let gate = Arc::new(RequestGate::new(&GateConfig::default()));
        let fetcher = PullListFetcher::new(ils.clone(), gate.clone(), PullListMode::Thin);

        let chains = fetcher
            .fetch(&fixtures::session(), &fixtures::branch("CEN"))
            .await
            .unwrap();

        let keys: Vec<_> = chains.iter().map(|c| c.hold_key.as_str()).collect();
        assert_eq!(keys, vec!["3", "1", "2"]);
        assert_eq!(chains[1].position, 1);
        assert_eq!(gate.stats().attempts, 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_branch_is_empty() {
        let ils = Arc::new(MockIls::new());
        let gate = Arc::new(RequestGate::new(&GateConfig::default()));
        let fetcher = PullListFetcher::new(ils, gate, PullListMode::Thick);

        let chains = fetcher
            .fetch(&fixtures::session(), &fixtures::branch("NOPE"))
            .await
            .unwrap();
        assert!(chains.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_retried_then_surfaced() {
        let ils = Arc::new(MockIls::new());
        ils.fail_operation("pull_list", "CEN").await;
        let gate = Arc::new(RequestGate::new(
            &GateConfig::default().with_max_retries(2).with_base_delay_ms(1),
        ));
        let fetcher = PullListFetcher::new(ils.clone(), gate.clone(), PullListMode::Thin);

        let result = fetcher
            .fetch(&fixtures::session(), &fixtures::branch("CEN"))
            .await;
        assert!(result.is_err());
        assert_eq!(ils.call_count("pull_list").await, 3);
    }
}
