//! emv: embed values into files
//!
//! Resolves command-line values through the capture patterns of a config
//! file, renders each target's replacement templates from them and rewrites
//! the target files with regex substitutions. The binary is at src/main.rs.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod logger;
pub mod patcher;
pub mod resolver;
pub mod rules;
pub mod runner;
pub mod template;

// Re-export commonly used types for convenience
pub use config::{Embedded, RunConfig, Target, ValueSpec, load_config};
pub use error::{ConfigError, EmvError, Result};
pub use patcher::{PatchMode, PatchStatus, apply_rules, patch_file};
pub use resolver::{ValueMapping, resolve_values};
pub use rules::{ReplacementRule, compile_rules};
pub use runner::{RunOptions, RunReport, Runner, run};
pub use template::{Template, TemplateError};
