//! `{placeholder}` discovery and substitution.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use iacheck_core::Settings;
use regex::{Regex, RegexBuilder};

/// Pattern naming an input inside a check file.
pub const INPUT_PATTERN: &str = r"\{(?P<input>[a-zA-Z0-9_\-]+)\}";

/// Errors raised during substitution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder has no value in the context
    #[error("missing value for placeholder {{{0}}}")]
    MissingValue(String),
}

fn input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(INPUT_PATTERN)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .expect("input pattern is valid")
    })
}

fn is_input_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Names of all inputs referenced in `text`, sorted and de-duplicated.
pub fn find_inputs(text: &str) -> BTreeSet<String> {
    input_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.name("input"))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace every `{name}` in `template` with its value from `context`.
///
/// `{{` and `}}` yield literal braces. Brace groups whose content is not an
/// input name (such as `{print $1}`) are copied unchanged.
pub fn substitute(template: &str, context: &Settings) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(end) = tail[1..].find('}') {
                let name = &tail[1..=end];
                if is_input_name(name) {
                    let value = context
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingValue(name.to_string()))?;
                    out.push_str(value);
                    rest = &tail[end + 2..];
                    continue;
                }
            }
        }

        // Lone brace
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Substitute every string in a list.
pub fn substitute_all(templates: &[String], context: &Settings) -> Result<Vec<String>, TemplateError> {
    templates.iter().map(|t| substitute(t, context)).collect()
}
