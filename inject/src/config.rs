//! Declarative container configuration, loaded from YAML.

use crate::error::{Error, Result};
use crate::qualifier::QualifierType;

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_BASE_NAME: &str = "fibre_inject";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Settings applied by [`Container::with_config`](crate::Container::with_config).
///
/// ```yaml
/// name: app
/// qualifiers:
///   - name: Premium
///   - name: Tag
///     repeatable: true
/// alternatives:
///   - mockPaymentService
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  #[serde(default = "default_name")]
  pub name: String,
  /// Extra qualifier types, on top of the built-in `Default`, `Any` and `Named`.
  #[serde(default)]
  pub qualifiers: Vec<QualifierConfig>,
  /// Bean names of alternatives to enable.
  #[serde(default)]
  pub alternatives: Vec<String>,
}

fn default_name() -> String {
  "default".to_string()
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      qualifiers: Vec::new(),
      alternatives: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QualifierConfig {
  pub name: String,
  #[serde(default)]
  pub repeatable: bool,
}

impl QualifierConfig {
  pub fn to_qualifier_type(&self) -> QualifierType {
    let qualifier_type = QualifierType::new(self.name.clone());
    if self.repeatable {
      qualifier_type.repeatable()
    } else {
      qualifier_type
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let config: ContainerConfig =
      serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    debug!(path = %path.display(), "loading container configuration");
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }

  fn validate(&self) -> Result<()> {
    if let Some(q) = self.qualifiers.iter().find(|q| q.name.trim().is_empty()) {
      return Err(Error::ConfigParse(format!(
        "qualifier name must not be empty (found {:?})",
        q.name
      )));
    }
    Ok(())
  }
}

/// Finds the configuration file in the working directory.
///
/// Looks for `fibre_inject.<env>.yaml` first, where `<env>` is
/// `environment_suffix` or else the `FIBRE_ENV` / `APP_ENV` variable, then for
/// `fibre_inject.yaml`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Like [`find_config_file`], searching `dir` instead of the working directory.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("FIBRE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!(
        "{}.{}.{}",
        DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
      ));
    }
  }
  files_to_check.push(format!(
    "{}.{}",
    DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION
  ));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check FIBRE_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn empty_document_uses_defaults() {
    let config = ContainerConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, ContainerConfig::default());
  }

  #[test]
  fn parses_qualifiers_and_alternatives() {
    let yaml = r#"
name: app
qualifiers:
  - name: Premium
  - name: Tag
    repeatable: true
alternatives:
  - mockPaymentService
"#;
    let config = ContainerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(
      config,
      ContainerConfig {
        name: "app".to_string(),
        qualifiers: vec![
          QualifierConfig {
            name: "Premium".to_string(),
            repeatable: false,
          },
          QualifierConfig {
            name: "Tag".to_string(),
            repeatable: true,
          },
        ],
        alternatives: vec!["mockPaymentService".to_string()],
      }
    );
    assert!(config.qualifiers[1].to_qualifier_type().is_repeatable());
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = ContainerConfig::from_yaml_str("name: app\nscopes: []\n").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
  }

  #[test]
  fn blank_qualifier_name_is_rejected() {
    let err = ContainerConfig::from_yaml_str("qualifiers:\n  - name: ' '\n").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
  }
}
