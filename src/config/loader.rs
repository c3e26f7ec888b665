//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SimConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SimConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let path = std::env::temp_dir().join("gateway-sim-loader-valid.toml");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
            visible_window = 4

            [[backends]]
            id = "b1"
            name = "Backend 1"

            [[routes]]
            id = "r1"
            path = "/api/one"
            backend = "b1"
            cacheable = true
            "#
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.visible_window, 4);
        assert_eq!(config.routes[0].backend, "b1");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_reference() {
        let path = std::env::temp_dir().join("gateway-sim-loader-invalid.toml");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
            [[routes]]
            id = "r1"
            path = "/api/one"
            backend = "missing"
            "#
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("unknown backend"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway-sim.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
