//! Value resolution
//!
//! Binds each positional argument to its configured name and, when the value
//! spec carries a pattern, adds one entry per named capture group.

use crate::config::ValueSpec;
use crate::error::{EmvError, PatternOrigin, Result};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Resolved name -> value table used to render templates
pub type ValueMapping = BTreeMap<String, String>;

/// Resolve positional inputs against the configured value specs
///
/// The Nth input belongs to the Nth spec. Named captures overwrite earlier
/// bindings of the same name, so a later spec wins over an earlier one.
pub fn resolve_values<S: AsRef<str>>(inputs: &[S], specs: &[ValueSpec]) -> Result<ValueMapping> {
    if inputs.len() != specs.len() {
        return Err(EmvError::Arity {
            expected: specs.len(),
            actual: inputs.len(),
        });
    }

    let mut values = ValueMapping::new();

    for (input, spec) in inputs.iter().zip(specs) {
        let input = input.as_ref();
        debug!(name = %spec.name, value = %input, "bind value");
        values.insert(spec.name.clone(), input.to_string());

        let Some(pattern) = spec.pattern() else {
            continue;
        };

        let regex = Regex::new(pattern).map_err(|source| EmvError::PatternCompile {
            origin: PatternOrigin::Values,
            pattern: pattern.to_string(),
            source,
        })?;

        let captures = regex.captures(input).ok_or_else(|| EmvError::NoMatch {
            input: input.to_string(),
            pattern: pattern.to_string(),
        })?;

        for (index, name) in regex.capture_names().enumerate() {
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                continue;
            };
            if let Some(m) = captures.get(index) {
                debug!(name, value = m.as_str(), from = %spec.name, "bind capture");
                values.insert(name.to_string(), m.as_str().to_string());
            }
        }
    }

    Ok(values)
}
