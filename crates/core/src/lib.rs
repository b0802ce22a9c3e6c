pub mod auth;
pub mod config;
pub mod gate;
pub mod holds;
pub mod ils;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod testing;

pub use auth::{Credentials, Session, SessionAuthenticator};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use gate::{GateStats, RequestGate};
pub use holds::{Branch, EnrichmentOrchestrator, PullListFetcher, ReportRow, SortField};
pub use ils::{IlsApi, IlsError, IlswsClient};
pub use report::{FsReportEmitter, ReportEmitter, ReportError, XsltprocTransformer};
pub use runner::{BranchRunner, RunError, RunSummary};
