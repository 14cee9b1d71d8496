//! `cmdrouter-config`: configuration for the command router.
//!
//! Provides:
//! - Typed config schema (router flags, providers, logging)
//! - YAML loading
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-qualified messages

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use schema::{LoggingConfig, ProviderConfig, RouterConfig};
pub use io::{config_dir, config_file_path, load_config};
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use defaults::apply_all_defaults;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// A loaded config together with the validation warnings it produced.
#[derive(Debug)]
pub struct PreparedConfig {
    pub config: RouterConfig,
    pub warnings: Vec<ConfigValidationError>,
}

/// Load, substitute env vars, apply defaults and validate a config file.
///
/// The first validation error is returned as the error. Warnings are handed
/// back to the caller, which usually logs them once its subscriber is up.
pub async fn load_and_prepare(path: &Path) -> Result<PreparedConfig> {
    let raw = io::load_raw(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    let config: RouterConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    if let Some(first) = report.errors.into_iter().next() {
        return Err(first.into());
    }

    Ok(PreparedConfig { config, warnings: report.warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepare_applies_defaults_to_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = load_and_prepare(&config_file_path(dir.path())).await.unwrap();
        assert_eq!(prepared.config.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[tokio::test]
    async fn prepare_rejects_invalid_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "providers:\n  local:\n    kind: ollama\n    model: ''\n")
            .await
            .unwrap();
        let err = load_and_prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("providers.local.model"));
    }

    #[tokio::test]
    async fn prepare_hands_back_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "enable_global_match: false\n").await.unwrap();
        let prepared = load_and_prepare(&path).await.unwrap();
        assert_eq!(prepared.warnings.len(), 1);
        assert_eq!(prepared.warnings[0].path, "activate_by_wake");
    }
}
