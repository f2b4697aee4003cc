//! Configuration for emv
//!
//! A config names the values taken from the command line and the targets
//! (groups of files plus the embed rules applied to them). JSON is the
//! default format; files ending in `.toml` are read as TOML with the same shape.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "emv.json";

/// Top-level configuration document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub values: Vec<ValueSpec>,

    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A named command-line value, optionally split into sub-values by a pattern
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValueSpec {
    pub name: String,

    #[serde(default, alias = "regex")]
    pub pattern: Option<String>,
}

impl ValueSpec {
    /// The capture pattern, if one is set and non-empty
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }
}

/// Files sharing one set of embed rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub embeddeds: Vec<Embedded>,
}

/// One search pattern with its replacement template
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Embedded {
    #[serde(alias = "regex")]
    pub pattern: String,

    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&content, ConfigFormat::from_path(path), path)?;
    validate_config(&config)?;

    Ok(config)
}

fn parse_config(content: &str, format: ConfigFormat, path: &Path) -> Result<RunConfig, ConfigError> {
    match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reject configs that could never do anything useful
pub fn validate_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.values.is_empty() {
        return Err(ConfigError::InvalidFormat {
            reason: "\"values\" must contain at least one entry".to_string(),
        });
    }

    if config.targets.is_empty() {
        return Err(ConfigError::InvalidFormat {
            reason: "\"targets\" must contain at least one entry".to_string(),
        });
    }

    if let Some(spec) = config.values.iter().find(|v| v.name.is_empty()) {
        return Err(ConfigError::InvalidFormat {
            reason: format!("value with pattern {:?} has an empty name", spec.pattern.as_deref().unwrap_or("")),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_JSON: &str = r#"
{
    "values" : [
        {
            "name" : "version",
            "pattern" : "^(?P<major>[0-9]+)\\.(?P<minor>[0-9]+)\\.(?P<revision>[0-9]+)$"
        },
        {
            "name" : "value2"
        }
    ],
    "targets" : [
        {
            "files" : [
                "version.properties",
                "version2.properties"
            ],
            "embeddeds" : [
                {
                    "pattern" : "version=v[0-9]+\\.[0-9]+\\.[0-9]+",
                    "replacement" : "version=v{{.version}}"
                }
            ]
        },
        {
            "files" : [
                "version.xml"
            ],
            "embeddeds" : [
                {
                    "regex" : "<major>[0-9]+</major>",
                    "replacement" : "<major>{{.major}}</major>"
                }
            ]
        }
    ]
}
"#;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "emv.json", SAMPLE_JSON);

        let config = load_config(&path).unwrap();

        assert_eq!(config.values.len(), 2);
        assert_eq!(config.values[0].name, "version");
        assert_eq!(
            config.values[0].pattern(),
            Some(r"^(?P<major>[0-9]+)\.(?P<minor>[0-9]+)\.(?P<revision>[0-9]+)$")
        );
        assert_eq!(config.values[1].pattern(), None);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].files, vec!["version.properties", "version2.properties"]);
        // "regex" is accepted as an alias for "pattern"
        assert_eq!(config.targets[1].embeddeds[0].pattern, "<major>[0-9]+</major>");
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "emv.toml",
            r#"
[[values]]
name = "version"
pattern = '^(?P<major>\d+)\.(?P<minor>\d+)$'

[[targets]]
files = ["Cargo.toml"]

[[targets.embeddeds]]
pattern = '(?m)^version = "[^"]*"'
replacement = 'version = "{{.version}}"'
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.values[0].name, "version");
        assert_eq!(config.targets[0].embeddeds[0].replacement, r#"version = "{{.version}}""#);
    }

    #[test]
    fn test_invalid_format() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "emv.json", r#"{ "value" : [ { "name" : "version" } ] }"#);

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { .. }));
        assert!(err.to_string().starts_with("invalid format"));
    }

    #[test]
    fn test_missing_targets() {
        let config = RunConfig {
            values: vec![ValueSpec {
                name: "v".to_string(),
                pattern: None,
            }],
            targets: vec![],
        };
        assert!(validate_config(&config).unwrap_err().to_string().contains("targets"));
    }

    #[test]
    fn test_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "emv.json", "");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("EOF"));
    }

    #[test]
    fn test_file_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");

        let err = load_config(&path).unwrap_err();
        match err {
            ConfigError::Io { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("emv.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("emv.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("emv")), ConfigFormat::Json);
    }
}
