//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Deserialize TOML text, then run semantic validation.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    parse_config(&fs::read_to_string(path)?)
}

/// Load from `path` when given; built-in defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    path.map_or_else(|| Ok(GatewayConfig::default()), load_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_values_are_reported() {
        let err = parse_config("[breaker]\npermitted_probes = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().starts_with("invalid config: breaker.permitted_probes"));
    }

    #[test]
    fn test_broken_toml() {
        assert!(matches!(parse_config("[breaker"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_roundtrip_and_missing_file() {
        let path = std::env::temp_dir().join("resilient_gateway_loader_test.toml");
        fs::write(&path, "[gateway]\nresource_key = \"products\"\n").unwrap();
        assert_eq!(load_config(&path).unwrap().gateway.resource_key, "products");

        fs::remove_file(&path).unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
        assert!(load_or_default(None).is_ok());
    }
}
