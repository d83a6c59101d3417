//! Staging configuration

use sc_classify::ClassifierConfig;
use sc_fixers::Level;
use sc_intern::Interner;
use sc_syntax::StageTag;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read staging config {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The contents are not a valid configuration
    #[error("failed to parse staging config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Stage assumed for identifiers nothing else classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ambient {
    /// Later stage
    Run,
    /// Generation stage
    Compile,
}

impl From<Ambient> for StageTag {
    fn from(ambient: Ambient) -> Self {
        match ambient {
            Ambient::Run => Self::RunTimeOnly,
            Ambient::Compile => Self::CompileTimeOnly,
        }
    }
}

/// Settings of one staging compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingConfig {
    /// Highest language level templates may use
    pub max_language_version: Level,

    /// Attribute that marks a member as a template
    pub template_attribute: String,

    /// Aliases whose members run during generation
    pub compile_time_aliases: Vec<String>,

    /// Suffix of generation program names
    pub program_suffix: String,

    /// Check verbatim copies against their originals
    pub verify_passthrough: bool,

    /// Ambient stage outside any run-time construct
    pub default_ambient: Ambient,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_language_version: 7,
            template_attribute: "template".to_owned(),
            compile_time_aliases: vec!["meta".to_owned()],
            program_suffix: sc_meta::DEFAULT_PROGRAM_SUFFIX.to_owned(),
            verify_passthrough: false,
            default_ambient: Ambient::Run,
        }
    }
}

impl StagingConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Classifier settings with the aliases interned in `interner`
    #[must_use]
    pub fn classifier_config(&self, interner: &Interner) -> ClassifierConfig {
        self.compile_time_aliases
            .iter()
            .fold(ClassifierConfig::new(self.default_ambient.into()), |config, alias| {
                config.with_alias(interner.intern(alias))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = StagingConfig::from_toml_str("").unwrap();
        assert_eq!(config, StagingConfig::default());
        assert_eq!(config.max_language_version, 7);
        assert_eq!(config.program_suffix, "_generator");
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let config = StagingConfig::from_toml_str(
            r#"
            max_language_version = 5
            compile_time_aliases = ["meta", "gen"]
            default_ambient = "compile"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_language_version, 5);
        assert_eq!(config.compile_time_aliases, ["meta", "gen"]);
        assert_eq!(config.default_ambient, Ambient::Compile);
        assert_eq!(config.template_attribute, "template");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = StagingConfig::from_toml_str("max_version = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = StagingConfig::load(Path::new("/nonexistent/staging.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/staging.toml"));
    }

    #[test]
    fn test_classifier_config_interns_aliases() {
        let interner = Interner::new();
        let config = StagingConfig::default().classifier_config(&interner);
        assert_eq!(config.default_ambient, StageTag::RunTimeOnly);
        assert!(config.compile_time_aliases.contains(&interner.intern("meta")));
    }
}
