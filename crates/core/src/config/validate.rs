use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one branch, with unique keys and non-empty names
/// - Concurrency limit is not 0
/// - Sort order is not empty
/// - Report UTC offset is within a day
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.gate.max_concurrent_requests == 0 {
        return Err(ConfigError::ValidationError(
            "gate.max_concurrent_requests cannot be 0".to_string(),
        ));
    }

    if config.pipeline.sort_order.is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.sort_order cannot be empty".to_string(),
        ));
    }

    if config.report.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(ConfigError::ValidationError(format!(
            "report.utc_offset_minutes out of range: {}",
            config.report.utc_offset_minutes
        )));
    }

    if config.branches.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one [[branches]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for branch in &config.branches {
        if branch.key.trim().is_empty() || branch.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "branch key and name cannot be empty".to_string(),
            ));
        }
        if !seen.insert(branch.key.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate branch key: {}",
                branch.key
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BranchConfig, GateConfig, IlsConfig, PipelineConfig, ReportConfig,
    };
    use std::path::PathBuf;

    fn config_with(branches: Vec<BranchConfig>) -> Config {
        Config {
            ils: IlsConfig {
                hostname: "ils.example.org".to_string(),
                port: 443,
                webapp: "ilsws".to_string(),
                client_id: "PAGING".to_string(),
                username: "pager".to_string(),
                password: "secret".to_string(),
                originating_app_id: "pullist".to_string(),
                timeout_secs: 600,
                base_url: None,
            },
            gate: GateConfig::default(),
            pipeline: PipelineConfig::default(),
            report: ReportConfig {
                csv_dir: PathBuf::from("/tmp"),
                html_dir: PathBuf::from("/srv/paging"),
                xsl_title: PathBuf::from("title.xsl"),
                xsl_item: PathBuf::from("item.xsl"),
                xsltproc_path: PathBuf::from("xsltproc"),
                utc_offset_minutes: -480,
                metrics_textfile: None,
            },
            branches,
        }
    }

    fn branch(key: &str, name: &str) -> BranchConfig {
        BranchConfig {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = config_with(vec![branch("CEN", "Central"), branch("EAST", "Eastside")]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = config_with(vec![branch("CEN", "Central")]);
        config.gate.max_concurrent_requests = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_no_branches_fails() {
        let config = config_with(vec![]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_branch_fails() {
        let config = config_with(vec![branch("CEN", "Central"), branch("CEN", "Main")]);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("CEN"));
    }

    #[test]
    fn test_validate_empty_sort_order_fails() {
        let mut config = config_with(vec![branch("CEN", "Central")]);
        config.pipeline.sort_order.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_utc_offset_range() {
        let mut config = config_with(vec![branch("CEN", "Central")]);
        config.report.utc_offset_minutes = 330;
        assert!(validate_config(&config).is_ok());
        config.report.utc_offset_minutes = -1440;
        assert!(validate_config(&config).is_err());
    }
}
