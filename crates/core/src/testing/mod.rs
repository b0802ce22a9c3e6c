//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the ILS transport and the
//! report sink, allowing whole-pipeline tests without a Symphony server,
//! `xsltproc` or output directories.
//!
//! # Example
//!
//! ```rust,ignore
//! use pullist_core::testing::{HoldSpec, MockEmitter, MockIls};
//!
//! let ils = MockIls::new();
//! ils.add_hold(&HoldSpec::new("1", HoldType::Copy)).await;
//! ils.add_thin_pull_list("CEN", &["1"]).await;
//!
//! let emitter = MockEmitter::new();
//! // Wire into a BranchRunner...
//! ```

mod hold_spec;
mod mock_emitter;
mod mock_ils;

pub use hold_spec::HoldSpec;
pub use mock_emitter::{CopyTransformer, MockEmitter, RecordedEmit};
pub use mock_ils::{MockIls, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::auth::{Credentials, Session};
    use crate::config::{
        BranchConfig, Config, GateConfig, IlsConfig, PipelineConfig, ReportConfig,
    };
    use crate::holds::Branch;

    pub fn session() -> Session {
        Session::new("mock-session")
    }

    pub fn credentials() -> Credentials {
        Credentials::new("pager", "secret")
    }

    /// A branch whose display name is `{key}Library`.
    pub fn branch(key: &str) -> Branch {
        Branch::new(key, format!("{}Library", key))
    }

    /// Report settings writing under `root`.
    pub fn report_config(root: &Path) -> ReportConfig {
        ReportConfig {
            csv_dir: root.join("csv"),
            html_dir: root.join("html"),
            xsl_title: root.join("title.xsl"),
            xsl_item: root.join("item.xsl"),
            xsltproc_path: "xsltproc".into(),
            utc_offset_minutes: -480,
            metrics_textfile: None,
        }
    }

    pub fn ils_config(base_url: &str) -> IlsConfig {
        IlsConfig {
            hostname: "ils.example.org".to_string(),
            port: 443,
            webapp: "symws".to_string(),
            client_id: "PULLIST".to_string(),
            username: "pager".to_string(),
            password: "secret".to_string(),
            originating_app_id: "pullist".to_string(),
            timeout_secs: 5,
            base_url: Some(base_url.to_string()),
        }
    }

    /// A complete configuration for the given branch keys.
    pub fn config(root: &Path, branch_keys: &[&str]) -> Config {
        Config {
            ils: ils_config("http://127.0.0.1:1/symws"),
            gate: GateConfig::default().with_base_delay_ms(1),
            pipeline: PipelineConfig::default(),
            report: report_config(root),
            branches: branch_keys
                .iter()
                .map(|k| {
                    let branch = branch(k);
                    BranchConfig {
                        key: branch.key,
                        name: branch.name,
                    }
                })
                .collect(),
        }
    }
}
