//! Run orchestration
//!
//! Resolves the values once, then walks the targets in order: compile the
//! target's rules, list the rendered replacements, patch each file. The first
//! error aborts the run; files patched before it stay patched.

use crate::config::{RunConfig, Target, load_config};
use crate::diff::DiffFormatter;
use crate::error::{EmvError, IoOp, Result};
use crate::patcher::{PatchMode, PatchStatus, patch_file};
use crate::resolver::{ValueMapping, resolve_values};
use crate::rules::compile_rules;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: PatchMode,
    pub color: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: PatchMode::Write,
            color: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: PatchStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetReport {
    pub replacements: Vec<String>,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub values: ValueMapping,
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    /// Number of files updated (or, in a dry run, that would be updated)
    pub fn changed_files(&self) -> usize {
        self.targets
            .iter()
            .flat_map(|t| &t.files)
            .filter(|f| f.status.is_changed())
            .count()
    }
}

pub struct Runner {
    config: RunConfig,
    base_dir: Option<PathBuf>,
    options: RunOptions,
    formatter: DiffFormatter,
}

fn output_error(e: io::Error) -> EmvError {
    EmvError::io(IoOp::Write, Path::new("<output>"), e)
}

impl Runner {
    pub fn new(config: RunConfig, base_dir: Option<PathBuf>, options: RunOptions) -> Self {
        Self {
            config,
            base_dir,
            options,
            formatter: DiffFormatter::new(options.color),
        }
    }

    /// Resolve a configured file path against the base directory
    pub fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.base_dir {
            Some(base) if !path.is_absolute() && !base.as_os_str().is_empty() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn run<S: AsRef<str>, W: Write>(&self, args: &[S], out: &mut W) -> Result<RunReport> {
        let values = resolve_values(args, &self.config.values)?;
        info!(count = values.len(), "resolved values");

        let mut report = RunReport {
            values,
            targets: Vec::with_capacity(self.config.targets.len()),
        };

        for (index, target) in self.config.targets.iter().enumerate() {
            debug!(index, files = target.files.len(), "processing target");
            let target_report = self.run_target(target, &report.values, out)?;
            report.targets.push(target_report);
        }

        Ok(report)
    }

    fn run_target<W: Write>(
        &self,
        target: &Target,
        values: &ValueMapping,
        out: &mut W,
    ) -> Result<TargetReport> {
        // All rules must compile before any file of this target is touched
        let rules = compile_rules(&target.embeddeds, values)?;

        writeln!(out, "Embedded values:").map_err(output_error)?;
        for rule in &rules {
            writeln!(out, "  {}", rule.replacement).map_err(output_error)?;
        }

        let legend = match self.options.mode {
            PatchMode::Write => "Files: ([U] Updated, [-] None)",
            PatchMode::DryRun => "Files: ([~] Would update, [-] None)",
        };
        writeln!(out, "{}", legend).map_err(output_error)?;

        let mut files = Vec::with_capacity(target.files.len());

        for file in &target.files {
            let path = self.resolve_path(file);
            let outcome = patch_file(&path, &rules, self.options.mode)?;

            writeln!(
                out,
                "  {} {}",
                self.formatter.format_marker(outcome.status.marker()),
                path.display()
            )
            .map_err(output_error)?;

            if outcome.status == PatchStatus::Pending {
                let preview = self.formatter.format_changes(
                    &String::from_utf8_lossy(&outcome.original),
                    &String::from_utf8_lossy(&outcome.patched),
                );
                out.write_all(preview.as_bytes()).map_err(output_error)?;
            }

            files.push(FileReport {
                path,
                status: outcome.status,
            });
        }

        writeln!(out).map_err(output_error)?;

        Ok(TargetReport {
            replacements: rules.into_iter().map(|r| r.replacement).collect(),
            files,
        })
    }
}

/// Load the config at `config_path` and run it
///
/// Relative target files resolve against `base_dir`, or the config file's
/// directory when none is given.
pub fn run<S: AsRef<str>, W: Write>(
    config_path: &Path,
    args: &[S],
    base_dir: Option<&Path>,
    options: RunOptions,
    out: &mut W,
) -> Result<RunReport> {
    let config = load_config(config_path)?;

    let base_dir = base_dir
        .map(Path::to_path_buf)
        .or_else(|| config_path.parent().map(Path::to_path_buf));

    Runner::new(config, base_dir, options).run(args, out)
}
