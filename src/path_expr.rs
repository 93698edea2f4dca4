//! Field path expressions
//!
//! Syntax:
//! - `field` -> field of the declaring component's parent
//! - `#{reference}` -> the component registered under `reference`
//! - `#{reference}.field` -> one field of that component
//!
//! References may themselves be dotted component paths (`window.form`).

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ViewError};
use crate::interner::intern;

static REFERENCE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\{([^{}]+)\}(?:\.(\w+))?$").expect("valid reference regex"));

static BARE_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").expect("valid field regex"));

/// Parsed form of a field or scope path expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedBinding {
    /// Referenced component; `None` means the declaring component's parent
    pub target: Option<Arc<str>>,
    pub field: Option<Arc<str>>,
}

impl ResolvedBinding {
    pub fn parent_field(field: &str) -> Self {
        Self {
            target: None,
            field: Some(intern(field)),
        }
    }

    pub fn component(reference: &str, field: Option<&str>) -> Self {
        Self {
            target: Some(intern(reference)),
            field: field.map(intern),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn targets_parent(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Display for ResolvedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target, &self.field) {
            (Some(target), Some(field)) => write!(f, "#{{{}}}.{}", target, field),
            (Some(target), None) => write!(f, "#{{{}}}", target),
            (None, Some(field)) => f.write_str(field),
            (None, None) => f.write_str("<parent>"),
        }
    }
}

/// Parse a path expression declared on `component`
pub fn parse_path_expression(component: &str, expression: &str) -> Result<ResolvedBinding> {
    let invalid = |reason: &str| ViewError::InvalidPathExpression {
        component: component.to_string(),
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(invalid("expression is empty"));
    }

    if trimmed.starts_with('#') {
        let captures = REFERENCE_PATH
            .captures(trimmed)
            .ok_or_else(|| invalid("expected '#{reference}' optionally followed by '.field'"))?;

        let reference = captures[1].trim();
        if reference.is_empty() {
            return Err(invalid("component reference is empty"));
        }

        return Ok(ResolvedBinding::component(
            reference,
            captures.get(2).map(|m| m.as_str()),
        ));
    }

    if !BARE_FIELD.is_match(trimmed) {
        return Err(invalid("field names may only contain letters, digits and '_'"));
    }

    Ok(ResolvedBinding::parent_field(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_field_targets_parent() {
        let binding = parse_path_expression("name", "name").unwrap();
        assert!(binding.targets_parent());
        assert_eq!(binding.field(), Some("name"));
    }

    #[test]
    fn reference_with_field() {
        let binding = parse_path_expression("price", "#{other}.price").unwrap();
        assert_eq!(binding.target(), Some("other"));
        assert_eq!(binding.field(), Some("price"));
    }

    #[test]
    fn reference_without_field() {
        let binding = parse_path_expression("grid", "#{other}").unwrap();
        assert_eq!(binding.target(), Some("other"));
        assert_eq!(binding.field(), None);
    }

    #[test]
    fn dotted_reference_path() {
        let binding = parse_path_expression("grid", "#{window.form}.positions").unwrap();
        assert_eq!(binding.target(), Some("window.form"));
        assert_eq!(binding.field(), Some("positions"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let binding = parse_path_expression("grid", "  #{form}.number ").unwrap();
        assert_eq!(binding, ResolvedBinding::component("form", Some("number")));
    }

    #[test]
    fn display_round_trips_the_source_form() {
        assert_eq!(
            parse_path_expression("c", "#{form}.number").unwrap().to_string(),
            "#{form}.number"
        );
        assert_eq!(parse_path_expression("c", "number").unwrap().to_string(), "number");
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for expr in [
            "",
            "   ",
            "#{}",
            "#{ }",
            "#{form",
            "#{form}.",
            "#{form}price",
            "#{form}.a.b",
            "#form",
            "a.b",
            "price-list",
        ] {
            let err = parse_path_expression("c", expr).unwrap_err();
            assert!(
                matches!(err, ViewError::InvalidPathExpression { .. }),
                "expected InvalidPathExpression for {:?}, got {:?}",
                expr,
                err
            );
        }
    }

    #[test]
    fn error_names_component_and_expression() {
        let err = parse_path_expression("window.form.number", "#{form").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("MES-020"));
        assert!(msg.contains("window.form.number"));
        assert!(msg.contains("#{form"));
    }
}
