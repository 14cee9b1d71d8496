//! Config validation with path-qualified messages.

use crate::schema::{ProviderConfig, RouterConfig};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

pub fn validate(config: &RouterConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_matching(config, &mut report);
    validate_providers(config, &mut report);
    report
}

fn validate_matching(config: &RouterConfig, report: &mut ValidationReport) {
    if !config.enable_global_match && config.activate_by_wake {
        report.warn(
            "activate_by_wake",
            "Has no effect while enable_global_match is false; only /解析 will route",
        );
    }
    let id = config.text_provider_id.trim();
    if !id.is_empty() && !config.providers.is_empty() && !config.providers.contains_key(id) {
        report.warn(
            "text_provider_id",
            format!("'{id}' is not a locally configured provider; the host must know it"),
        );
    }
}

fn validate_providers(config: &RouterConfig, report: &mut ValidationReport) {
    for (id, provider) in &config.providers {
        let path = format!("providers.{id}");
        if id.trim().is_empty() {
            report.error("providers", "Provider id cannot be empty");
        }
        match provider {
            ProviderConfig::Ollama { model, .. } if model.trim().is_empty() => {
                report.error(format!("{path}.model"), "Model is required");
            }
            ProviderConfig::OpenRouter { api_key, model, .. } => {
                if api_key.trim().is_empty() {
                    report.error(format!("{path}.api_key"), "OpenRouter API key is required");
                }
                if model.trim().is_empty() {
                    report.error(format!("{path}.model"), "Model is required");
                }
            }
            ProviderConfig::Mock { responses } if responses.is_empty() => {
                report.warn(&path, "Mock provider has no responses; every call will fail");
            }
            _ => {}
        }
    }

    if let Some(default) = &config.default_provider {
        if !config.providers.contains_key(default) {
            report.error("default_provider", format!("Unknown provider '{default}'"));
        }
    }
}
