//! Preview formatting for dry runs

use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;

/// Color only when stdout is a terminal and NO_COLOR is unset (https://no-color.org/)
pub fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

pub struct DiffFormatter {
    use_color: bool,
}

impl DiffFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Changed lines only, numbered by old position for removals and new position for additions
    pub fn format_changes(&self, original: &str, patched: &str) -> String {
        let diff = TextDiff::from_lines(original, patched);
        let mut output = String::new();

        for change in diff.iter_all_changes() {
            let (sign, line_num) = match change.tag() {
                ChangeTag::Equal => continue,
                ChangeTag::Delete => ("-", change.old_index()),
                ChangeTag::Insert => ("+", change.new_index()),
            };

            let line = format!(
                "      L{}: {} {}",
                line_num.map(|i| i + 1).unwrap_or(0),
                sign,
                change.value().trim_end_matches(['\r', '\n'])
            );

            if self.use_color {
                let colored_line = match change.tag() {
                    ChangeTag::Delete => line.red(),
                    _ => line.green(),
                };
                output.push_str(&format!("{}\n", colored_line));
            } else {
                output.push_str(&line);
                output.push('\n');
            }
        }

        output
    }

    pub fn format_marker(&self, marker: &str) -> String {
        if !self.use_color {
            return marker.to_string();
        }
        match marker {
            "[U]" => marker.green().bold().to_string(),
            "[~]" => marker.yellow().bold().to_string(),
            _ => marker.dimmed().to_string(),
        }
    }
}
