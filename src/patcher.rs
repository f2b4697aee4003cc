use crate::error::{EmvError, IoOp, Result};
use crate::rules::ReplacementRule;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    Write,
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Updated,   // Content changed and was written back
    Unchanged, // No rule changed anything
    Pending,   // Content would change (dry run)
}

impl PatchStatus {
    pub fn marker(self) -> &'static str {
        match self {
            PatchStatus::Updated => "[U]",
            PatchStatus::Unchanged => "[-]",
            PatchStatus::Pending => "[~]",
        }
    }

    pub fn is_changed(self) -> bool {
        self != PatchStatus::Unchanged
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub status: PatchStatus,
    pub original: Vec<u8>,
    pub patched: Vec<u8>,
}

/// Apply every rule to the whole content, in order
///
/// Each rule sees the output of the previous one. Replacements go through
/// regex expansion, so `$1` / `${name}` refer to the rule's own capture
/// groups and `$$` produces a literal `$`. Bytes no rule matches are copied
/// through untouched, whatever their encoding.
pub fn apply_rules(content: &[u8], rules: &[ReplacementRule]) -> Vec<u8> {
    let mut result = content.to_vec();

    for rule in rules {
        result = rule
            .pattern
            .replace_all(&result, rule.replacement.as_bytes())
            .into_owned();
    }

    result
}

/// Patch one file, writing it back only when its content changed
pub fn patch_file(file_path: &Path, rules: &[ReplacementRule], mode: PatchMode) -> Result<FileOutcome> {
    let original = fs::read(file_path).map_err(|e| EmvError::io(IoOp::Read, file_path, e))?;

    let patched = apply_rules(&original, rules);

    let status = if patched == original {
        PatchStatus::Unchanged
    } else {
        match mode {
            PatchMode::Write => {
                write_preserving_permissions(file_path, &patched)?;
                PatchStatus::Updated
            }
            PatchMode::DryRun => PatchStatus::Pending,
        }
    };

    if status.is_changed() {
        info!(file = %file_path.display(), ?status, "patched");
    } else {
        debug!(file = %file_path.display(), "unchanged");
    }

    Ok(FileOutcome {
        status,
        original,
        patched,
    })
}

/// Replace the file through a sibling temp file carrying the original permissions
///
/// Symlinks are followed: the file they point to is replaced and the link stays.
fn write_preserving_permissions(file_path: &Path, content: &[u8]) -> Result<()> {
    let write_error = |e| EmvError::io(IoOp::Write, file_path, e);

    let real_path = fs::canonicalize(file_path).map_err(write_error)?;
    let permissions = fs::metadata(&real_path).map_err(write_error)?.permissions();

    let parent_dir = match real_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(write_error)?;
    temp_file.write_all(content).map_err(write_error)?;
    temp_file.as_file().sync_all().map_err(write_error)?;
    fs::set_permissions(temp_file.path(), permissions).map_err(write_error)?;

    temp_file
        .persist(&real_path)
        .map_err(|e| write_error(e.error))?;

    Ok(())
}
