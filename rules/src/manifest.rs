//! TOML parsing for `macrule.toml`.

use preprocessor::PreprocessorConfig;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Every section is optional; an empty file is a valid manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub preprocessor: PreprocessorSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// `[preprocessor]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PreprocessorSection {
    /// Namespace of `#pragma <namespace> rule`
    pub pragma_namespace: Option<String>,
    /// Predefined object-like macros
    pub defines: Option<BTreeMap<String, toml::Value>>,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSection {
    /// Colored diagnostics
    pub color: Option<bool>,
}

impl Manifest {
    /// Host configuration with the manifest's settings applied over the defaults
    pub fn preprocessor_config(&self) -> PreprocessorConfig {
        let mut config = PreprocessorConfig::default();
        if let Some(namespace) = &self.preprocessor.pragma_namespace {
            config = config.with_pragma_namespace(namespace.clone());
        }
        for (name, value) in self.preprocessor.defines.iter().flatten() {
            config = config.define(name.clone(), define_value(value));
        }
        config
    }

    pub fn color(&self) -> bool {
        self.output.color.unwrap_or(false)
    }
}

/// Replacement text of a `-D`-style define
fn define_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Boolean(true) => "1".to_string(),
        toml::Value::Boolean(false) => "0".to_string(),
        other => other.to_string(),
    }
}

/// Parse a `macrule.toml` string.
pub fn parse_manifest(content: &str) -> Result<Manifest, String> {
    toml::from_str(content).map_err(|e| format!("Failed to parse macrule.toml: {}", e))
}
