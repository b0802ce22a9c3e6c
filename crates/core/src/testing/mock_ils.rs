//! Mock ILS for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::auth::Session;
use crate::config::PullListMode;
use crate::ils::{
    BibFields, CallFields, HoldRecordFields, IlsApi, IlsError, ItemFields, PatronFields,
    PullListEntryFields, PullListFields, Record,
};

use super::HoldSpec;

/// A recorded request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation name, as used for request accounting ("login", "pull_list", "item", ...).
    pub operation: &'static str,
    /// Record key, branch key, or username for logins.
    pub key: String,
    /// Pull-list mode requested, for pull-list calls.
    pub mode: Option<PullListMode>,
}

type Table<F> = Arc<RwLock<HashMap<String, Record<F>>>>;

/// Mock implementation of the IlsApi trait.
///
/// Provides controllable behavior for testing:
/// - Serve configured records by key (unknown keys answer 404)
/// - Fail selected operations for selected keys, always or a fixed number of times
/// - Simulate latency and track peak concurrency
/// - Record every request
///
/// # Example
///
/// ```rust,ignore
/// use pullist_core::testing::{HoldSpec, MockIls};
///
/// let ils = MockIls::new();
/// let spec = HoldSpec::new("1", HoldType::Copy);
/// ils.add_hold(&spec).await;
/// ils.add_thin_pull_list("CEN", &["1"]).await;
/// ils.fail_operation("item", "I1").await;
/// ```
pub struct MockIls {
    session_token: Arc<RwLock<String>>,
    login_fails: Arc<RwLock<bool>>,
    pull_lists: Arc<RwLock<HashMap<String, Vec<Record<PullListEntryFields>>>>>,
    holds: Table<HoldRecordFields>,
    items: Table<ItemFields>,
    calls: Table<CallFields>,
    bibs: Table<BibFields>,
    patrons: Table<PatronFields>,
    /// Remaining injected failures per (operation, key); `None` fails forever.
    failures: Arc<RwLock<HashMap<(String, String), Option<u32>>>>,
    requests: Arc<RwLock<Vec<RecordedCall>>>,
    latency: Arc<RwLock<Option<Duration>>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl std::fmt::Debug for MockIls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockIls")
            .field("active", &self.active.load(Ordering::SeqCst))
            .field("peak", &self.peak.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for MockIls {
    fn default() -> Self {
        Self::new()
    }
}

struct Active<'a>(&'a AtomicUsize);

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockIls {
    /// Create a mock with no records and token "mock-session".
    pub fn new() -> Self {
        Self {
            session_token: Arc::new(RwLock::new("mock-session".to_string())),
            login_fails: Arc::new(RwLock::new(false)),
            pull_lists: Arc::new(RwLock::new(HashMap::new())),
            holds: Arc::new(RwLock::new(HashMap::new())),
            items: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(HashMap::new())),
            bibs: Arc::new(RwLock::new(HashMap::new())),
            patrons: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(None)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub async fn set_session_token(&self, token: &str) {
        *self.session_token.write().await = token.to_string();
    }

    /// Make every login answer `LoginFailed`.
    pub async fn fail_login(&self, fail: bool) {
        *self.login_fails.write().await = fail;
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    /// Register every record `spec` depends on.
    pub async fn add_hold(&self, spec: &HoldSpec) {
        self.holds
            .write()
            .await
            .insert(spec.hold_key.clone(), spec.hold_record());
        self.items
            .write()
            .await
            .insert(spec.item_key(), spec.item_record());
        self.calls
            .write()
            .await
            .insert(spec.call_key(), spec.call_record());
        self.bibs
            .write()
            .await
            .insert(spec.bib_key(), spec.bib_record());
        self.patrons
            .write()
            .await
            .insert(spec.patron_key(), spec.patron_record());
    }

    /// Overwrite the raw hold type of a registered hold record.
    pub async fn set_hold_type(&self, hold_key: &str, hold_type: &str) {
        if let Some(fields) = self
            .holds
            .write()
            .await
            .get_mut(hold_key)
            .and_then(|r| r.fields.as_mut())
        {
            fields.hold_type = Some(hold_type.to_string());
        }
    }

    /// Remove one record; lookups for it then answer 404.
    pub async fn remove_record(&self, operation: &str, key: &str) {
        match operation {
            "hold_record" => {
                self.holds.write().await.remove(key);
            }
            "item" => {
                self.items.write().await.remove(key);
            }
            "call" => {
                self.calls.write().await.remove(key);
            }
            "bib" => {
                self.bibs.write().await.remove(key);
            }
            "patron" => {
                self.patrons.write().await.remove(key);
            }
            other => panic!("Unknown record operation: {}", other),
        }
    }

    pub async fn set_pull_list(&self, branch_key: &str, entries: Vec<Record<PullListEntryFields>>) {
        self.pull_lists
            .write()
            .await
            .insert(branch_key.to_string(), entries);
    }

    /// Pull list of key-only entries; item keys follow [`HoldSpec`] naming.
    pub async fn add_thin_pull_list(&self, branch_key: &str, hold_keys: &[&str]) {
        let entries = hold_keys
            .iter()
            .map(|k| {
                Record::new(
                    "",
                    PullListEntryFields {
                        hold_record: Record::key_only(*k),
                        item: Record::key_only(format!("I{}", k)),
                    },
                )
            })
            .collect();
        self.set_pull_list(branch_key, entries).await;
    }

    /// Pull list with every record embedded.
    pub async fn add_thick_pull_list(&self, branch_key: &str, specs: &[HoldSpec]) {
        let entries = specs.iter().map(HoldSpec::thick_entry).collect();
        self.set_pull_list(branch_key, entries).await;
    }

    /// Fail `operation` for `key` on every call.
    pub async fn fail_operation(&self, operation: &str, key: &str) {
        self.failures
            .write()
            .await
            .insert((operation.to_string(), key.to_string()), None);
    }

    /// Fail `operation` for `key` on the next `times` calls only.
    pub async fn fail_operation_times(&self, operation: &str, key: &str, times: u32) {
        self.failures
            .write()
            .await
            .insert((operation.to_string(), key.to_string()), Some(times));
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self, operation: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub async fn call_count_for(&self, operation: &str, key: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|c| c.operation == operation && c.key == key)
            .count()
    }

    pub async fn total_calls(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Highest number of requests ever in progress at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Record the request, simulate latency and apply injected failures.
    async fn enter(
        &self,
        operation: &'static str,
        key: &str,
        mode: Option<PullListMode>,
    ) -> Result<Active<'_>, IlsError> {
        self.requests.write().await.push(RecordedCall {
            operation,
            key: key.to_string(),
            mode,
        });

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let active = Active(&self.active);
        self.peak.fetch_max(now, Ordering::SeqCst);

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut failures = self.failures.write().await;
        if let Some(remaining) = failures.get_mut(&(operation.to_string(), key.to_string())) {
            let fail = match remaining {
                None => true,
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
            };
            if fail {
                return Err(IlsError::Api {
                    status: 500,
                    message: format!("Injected {} failure for {}", operation, key),
                });
            }
        }

        Ok(active)
    }

    async fn lookup<F: Clone>(
        &self,
        table: &Table<F>,
        operation: &'static str,
        key: &str,
    ) -> Result<Record<F>, IlsError> {
        let _active = self.enter(operation, key, None).await?;
        table.read().await.get(key).cloned().ok_or_else(|| IlsError::Api {
            status: 404,
            message: format!("{} {} not found", operation, key),
        })
    }
}

#[async_trait]
impl IlsApi for MockIls {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self, username: &str, _password: &str) -> Result<String, IlsError> {
        let _active = self.enter("login", username, None).await?;
        if *self.login_fails.read().await {
            return Err(IlsError::LoginFailed("Invalid credentials".to_string()));
        }
        Ok(self.session_token.read().await.clone())
    }

    async fn hold_item_pull_list(
        &self,
        _session: &Session,
        branch_key: &str,
        mode: PullListMode,
    ) -> Result<Record<PullListFields>, IlsError> {
        let _active = self.enter("pull_list", branch_key, Some(mode)).await?;
        let pull_list = self
            .pull_lists
            .read()
            .await
            .get(branch_key)
            .cloned()
            .unwrap_or_default();
        Ok(Record::new(branch_key, PullListFields { pull_list }))
    }

    async fn hold_record(
        &self,
        _session: &Session,
        key: &str,
    ) -> Result<Record<HoldRecordFields>, IlsError> {
        self.lookup(&self.holds, "hold_record", key).await
    }

    async fn item(&self, _session: &Session, key: &str) -> Result<Record<ItemFields>, IlsError> {
        self.lookup(&self.items, "item", key).await
    }

    async fn bib(&self, _session: &Session, key: &str) -> Result<Record<BibFields>, IlsError> {
        self.lookup(&self.bibs, "bib", key).await
    }

    async fn call(&self, _session: &Session, key: &str) -> Result<Record<CallFields>, IlsError> {
        self.lookup(&self.calls, "call", key).await
    }

    async fn patron(
        &self,
        _session: &Session,
        key: &str,
    ) -> Result<Record<PatronFields>, IlsError> {
        self.lookup(&self.patrons, "patron", key).await
    }
}
