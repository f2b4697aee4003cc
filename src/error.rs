//! Error types for emv
//!
//! Every failure aborts the run, so each variant carries enough context
//! (pattern, template, path) to diagnose the problem without re-running.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::template::TemplateError;

pub type Result<T, E = EmvError> = std::result::Result<T, E>;

/// Which configuration collection a pattern came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOrigin {
    Values,
    Embeddeds,
}

impl fmt::Display for PatternOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternOrigin::Values => f.write_str("values"),
            PatternOrigin::Embeddeds => f.write_str("embeddeds"),
        }
    }
}

/// File operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoOp::Read => f.write_str("read"),
            IoOp::Write => f.write_str("write"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid format: {reason}")]
    InvalidFormat { reason: String },
}

#[derive(Error, Debug)]
pub enum EmvError {
    #[error("failed to load the config file: {0}")]
    ConfigLoad(#[from] ConfigError),

    #[error("argument must be {expected} arguments")]
    Arity { expected: usize, actual: usize },

    #[error("'{pattern}' in {origin}-pattern is an invalid value: {source}")]
    PatternCompile {
        origin: PatternOrigin,
        pattern: String,
        source: regex::Error,
    },

    #[error("'{input}' does not match the pattern: {pattern}")]
    NoMatch { input: String, pattern: String },

    #[error("'{template}' in embeddeds-replacement is an invalid value: {source}")]
    Template {
        template: String,
        source: TemplateError,
    },

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        source: io::Error,
    },
}

impl EmvError {
    pub(crate) fn io(op: IoOp, path: &Path, source: io::Error) -> Self {
        EmvError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Suggest a fix for failures the user can act on directly
    pub fn hint(&self) -> Option<String> {
        let (path, source) = match self {
            EmvError::Io { path, source, .. } => (path.as_path(), source),
            EmvError::ConfigLoad(ConfigError::Io { path, source }) => (path.as_path(), source),
            EmvError::Arity { .. } => {
                return Some("Pass one VALUE per entry in the config's \"values\" list, in order".to_string());
            }
            _ => return None,
        };

        match source.kind() {
            io::ErrorKind::NotFound => Some(format!(
                "Check that '{}' exists; relative target paths are resolved against --target \
                 (default: the config file's directory)",
                path.display()
            )),
            io::ErrorKind::PermissionDenied => {
                let parent = path
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string());
                Some(format!(
                    "Check permissions: ls -l '{}' (the directory '{}' must also be writable)",
                    path.display(),
                    parent
                ))
            }
            _ => None,
        }
    }
}
