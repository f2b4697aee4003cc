//! Embed rule compilation

use crate::config::Embedded;
use crate::error::{EmvError, PatternOrigin, Result};
use crate::resolver::ValueMapping;
use crate::template::Template;
use regex::bytes::Regex;
use tracing::debug;

/// A compiled search pattern and its rendered replacement
///
/// Patterns match raw bytes so files that are not valid UTF-8 can still be patched.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl PartialEq for ReplacementRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.replacement == other.replacement
    }
}

/// Compile every (pattern, template) pair of a target, in order
///
/// Either all rules compile or none are returned, so a bad rule never leaves
/// a target half-processed.
pub fn compile_rules(embeddeds: &[Embedded], values: &ValueMapping) -> Result<Vec<ReplacementRule>> {
    embeddeds
        .iter()
        .map(|embedded| compile_rule(embedded, values))
        .collect()
}

fn compile_rule(embedded: &Embedded, values: &ValueMapping) -> Result<ReplacementRule> {
    let pattern = Regex::new(&embedded.pattern).map_err(|source| EmvError::PatternCompile {
        origin: PatternOrigin::Embeddeds,
        pattern: embedded.pattern.clone(),
        source,
    })?;

    let template_error = |source| EmvError::Template {
        template: embedded.replacement.clone(),
        source,
    };
    let template = Template::parse(&embedded.replacement).map_err(template_error)?;

    for name in template.field_names() {
        if !values.contains_key(name) {
            debug!(name, template = %embedded.replacement, "template references an unknown value");
        }
    }

    let replacement = template.render(values).map_err(template_error)?;
    debug!(pattern = %embedded.pattern, %replacement, "compiled rule");

    Ok(ReplacementRule { pattern, replacement })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateError;

    fn embedded(pattern: &str, replacement: &str) -> Embedded {
        Embedded {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }

    fn values() -> ValueMapping {
        [("val1", "a"), ("val2", "b")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compile_rules() {
        let embeddeds = vec![
            embedded("val1=(.+)", "val1={{.val1}}"),
            embedded("val2=(.+)", "val2={{.val2}}"),
        ];

        let rules = compile_rules(&embeddeds, &values()).unwrap();

        let expected = vec![
            ReplacementRule {
                pattern: Regex::new("val1=(.+)").unwrap(),
                replacement: "val1=a".to_string(),
            },
            ReplacementRule {
                pattern: Regex::new("val2=(.+)").unwrap(),
                replacement: "val2=b".to_string(),
            },
        ];
        assert_eq!(rules, expected);
    }

    #[test]
    fn test_invalid_pattern() {
        let embeddeds = vec![
            embedded("ok", "{{.val1}}"),
            embedded("version=v[0-9", "version=v{{.val1}}"),
        ];

        let err = compile_rules(&embeddeds, &values()).unwrap_err();
        assert!(matches!(
            err,
            EmvError::PatternCompile { origin: PatternOrigin::Embeddeds, .. }
        ));
        assert!(
            err.to_string()
                .starts_with("'version=v[0-9' in embeddeds-pattern is an invalid value: ")
        );
    }

    #[test]
    fn test_invalid_template() {
        let embeddeds = vec![embedded("version=v[0-9]+", "version=v{{.val1}")];

        let err = compile_rules(&embeddeds, &values()).unwrap_err();
        match &err {
            EmvError::Template { template, source } => {
                assert_eq!(template, "version=v{{.val1}");
                assert!(matches!(source, TemplateError::UnexpectedToken { .. }));
            }
            other => panic!("expected Template error, got {:?}", other),
        }
        assert!(
            err.to_string()
                .starts_with("'version=v{{.val1}' in embeddeds-replacement is an invalid value: unexpected \"}\" in operand")
        );
    }

    #[test]
    fn test_render_failure_is_template_error() {
        let embeddeds = vec![embedded("x", "{{.val1.sub}}")];
        let err = compile_rules(&embeddeds, &values()).unwrap_err();
        assert!(matches!(err, EmvError::Template { .. }));
    }

    #[test]
    fn test_empty_embeddeds() {
        assert!(compile_rules(&[], &values()).unwrap().is_empty());
    }
}
