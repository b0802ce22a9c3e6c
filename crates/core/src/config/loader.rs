use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PULLIST_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[ils]
hostname = "ils.example.org"
webapp = "ilsws"
client_id = "PAGING"
username = "pager"
password = "secret"

[report]
html_dir = "/srv/paging"
xsl_title = "/srv/paging/title.xsl"
xsl_item = "/srv/paging/item.xsl"

[[branches]]
key = "CEN"
name = "Central"
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.ils.hostname, "ils.example.org");
        assert_eq!(config.branches.len(), 1);
        assert_eq!(config.branches[0].key, "CEN");
    }

    #[test]
    fn test_load_config_from_str_missing_ils() {
        let toml = r#"
[[branches]]
key = "CEN"
name = "Central"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/pullist.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", MINIMAL).unwrap();
        writeln!(
            temp_file,
            r#"
[[branches]]
key = "EAST"
name = "Eastside"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.ils.username, "pager");
        let keys: Vec<_> = config.branches.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["CEN", "EAST"]);
    }
}
