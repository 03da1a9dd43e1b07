//! Preprocessor configuration

/// Settings for one preprocessing run
#[derive(Debug, Clone)]
pub struct PreprocessorConfig {
    /// Predefined object-like macros as `(name, replacement text)`
    pub defines: Vec<(String, String)>,

    /// Pragma namespace handled by the rule system (`#pragma <namespace> rule ...`)
    pub pragma_namespace: String,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            defines: vec![("__MACRULE__".to_string(), "1".to_string())],
            pragma_namespace: "macrule".to_string(),
        }
    }
}

impl PreprocessorConfig {
    /// Add or replace a predefined macro
    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.defines.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.defines.push((name, value)),
        }
        self
    }

    pub fn with_pragma_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.pragma_namespace = namespace.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_replaces_existing() {
        let config = PreprocessorConfig::default()
            .define("DEBUG", "1")
            .define("DEBUG", "0");
        assert_eq!(
            config.defines.iter().filter(|(n, _)| n == "DEBUG").count(),
            1
        );
        assert!(config.defines.contains(&("DEBUG".to_string(), "0".to_string())));
        assert!(config.defines.iter().any(|(n, _)| n == "__MACRULE__"));
    }
}
