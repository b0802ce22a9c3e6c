use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::holds::SortField;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub ils: IlsConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub branches: Vec<BranchConfig>,
}

/// ILSWS connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IlsConfig {
    pub hostname: String,
    #[serde(default = "default_ils_port")]
    pub port: u16,
    pub webapp: String,
    /// Value of the `x-sirs-clientID` header.
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Value of the `sd-originating-app-id` header.
    #[serde(default = "default_app_id")]
    pub originating_app_id: String,
    /// Request timeout in seconds (default: 600)
    #[serde(default = "default_ils_timeout")]
    pub timeout_secs: u64,
    /// Overrides the URL derived from hostname/port/webapp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl IlsConfig {
    /// Base URL of the web services, always with a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => format!("{}/", url.trim_end_matches('/')),
            None => format!("https://{}:{}/{}/", self.hostname, self.port, self.webapp),
        }
    }
}

fn default_ils_port() -> u16 {
    443
}

fn default_app_id() -> String {
    "pullist".to_string()
}

fn default_ils_timeout() -> u64 {
    600
}

/// Request gate configuration (concurrency limit and retry policy)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    /// Maximum simultaneously in-flight requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles on every retry.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound for a single retry delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    100
}

fn default_max_delay() -> u64 {
    10_000
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl GateConfig {
    /// Sets the concurrency limit.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Sets the retry count.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial backoff delay.
    pub fn with_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.base_delay_ms = delay_ms;
        self
    }
}

/// How much detail the pull-list request asks the ILS to embed.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PullListMode {
    /// Hold, item, call and bib fields are embedded in the pull list.
    #[default]
    Thick,
    /// Only hold record and item keys; everything else is looked up.
    Thin,
}

/// Whether a session token is obtained per branch or once per run.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    #[default]
    PerBranch,
    Shared,
}

/// What a failed hold lookup does to the branch.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentFailurePolicy {
    /// Leave the hold out of the report and keep going.
    #[default]
    DropRecord,
    /// Treat the failure as fatal for the branch.
    AbortBranch,
}

/// What a branch-fatal error does to the run.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchFailurePolicy {
    /// Stop the whole run at the first failed branch.
    #[default]
    AbortRun,
    /// Record the failure and continue with the next branch.
    SkipBranch,
}

/// Pipeline behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pull_list_mode: PullListMode,
    #[serde(default)]
    pub session_policy: SessionPolicy,
    #[serde(default)]
    pub enrichment_failure: EnrichmentFailurePolicy,
    #[serde(default)]
    pub branch_failure: BranchFailurePolicy,
    /// Row fields compared in order when sorting a report.
    #[serde(default = "default_sort_order")]
    pub sort_order: Vec<SortField>,
}

fn default_sort_order() -> Vec<SortField> {
    vec![SortField::CallNumber, SortField::Title]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pull_list_mode: PullListMode::default(),
            session_policy: SessionPolicy::default(),
            enrichment_failure: EnrichmentFailurePolicy::default(),
            branch_failure: BranchFailurePolicy::default(),
            sort_order: default_sort_order(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Directory receiving `<Branch>_<Title|Items>.csv`.
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,
    /// Root of the per-branch HTML directories and the placeholder pages.
    pub html_dir: PathBuf,
    /// Stylesheet for the title-level list.
    pub xsl_title: PathBuf,
    /// Stylesheet for the item-level list.
    pub xsl_item: PathBuf,
    #[serde(default = "default_xsltproc")]
    pub xsltproc_path: PathBuf,
    /// Offset from UTC of the report timestamp, in minutes.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
    /// Prometheus text exposition file written at the end of a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_textfile: Option<PathBuf>,
}

fn default_csv_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_xsltproc() -> PathBuf {
    PathBuf::from("xsltproc")
}

fn default_utc_offset() -> i32 {
    -8 * 60
}

/// A branch to report on
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BranchConfig {
    /// Library key used by the ILS.
    pub key: String,
    /// Display name used in file paths and report headers.
    pub name: String,
}

/// Sanitized config for logging (password redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub ils: SanitizedIlsConfig,
    pub gate: GateConfig,
    pub pipeline: PipelineConfig,
    pub report: ReportConfig,
    pub branches: Vec<BranchConfig>,
}

/// Sanitized ILS config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIlsConfig {
    pub base_url: String,
    pub client_id: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            ils: SanitizedIlsConfig {
                base_url: config.ils.base_url(),
                client_id: config.ils.client_id.clone(),
                username: config.ils.username.clone(),
                password_configured: !config.ils.password.is_empty(),
                timeout_secs: config.ils.timeout_secs,
            },
            gate: config.gate.clone(),
            pipeline: config.pipeline.clone(),
            report: config.report.clone(),
            branches: config.branches.clone(),
        }
    }
}
