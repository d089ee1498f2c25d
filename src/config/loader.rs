//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV: &str = "BEDROCK_GATEWAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Resolve the config source: explicit path, then `BEDROCK_GATEWAY_CONFIG`,
/// then built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

    match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration file");
            load_config(&path)
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            let config = GatewayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [cluster]
            name = "todo"
            primary = [{ address = "127.0.0.1", port = 8888 }]
            "#,
        )
        .unwrap();
        assert_eq!(config.cluster.name, "todo");
    }

    #[test]
    fn test_parse_reports_validation() {
        let err = parse_config(
            r#"
            [cluster]
            name = ""
            primary = []
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("bedrock-gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[cluster]\nname = \"disk\"\nprimary = [{ address = \"10.1.1.1\", port = 8888 }]\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.cluster.name, "disk");
        let _ = fs::remove_file(&path);
    }
}
