//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - MES-001-009: Descriptor / IO errors
//! - MES-010-019: Declaration errors (names, references, data scopes)
//! - MES-020-029: Dependency resolution errors
//! - MES-030-039: Session errors

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// A component the resolver could not initialize, with the references it still waits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckComponent {
    pub reference: String,
    pub waiting_on: Vec<String>,
}

impl fmt::Display for StuckComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (waiting on {})", self.reference, self.waiting_on.join(", "))
    }
}

fn format_stuck(stuck: &[StuckComponent]) -> String {
    stuck
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_cycle(cycle: &Option<String>) -> String {
    match cycle {
        Some(cycle) => format!(" [cycle: {}]", cycle),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum ViewError {
    // ═══════════════════════════════════════════
    // DESCRIPTOR ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[MES-001] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[MES-002] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[MES-003] Invalid data scope '{raw}': expected 'entity' or 'plugin.entity'")]
    InvalidDataScope { raw: String },

    #[error("[MES-004] Unknown field type '{raw}' for field '{field}' of '{scope}'")]
    UnknownFieldType {
        raw: String,
        field: String,
        scope: String,
    },

    // ═══════════════════════════════════════════
    // DECLARATION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[MES-010] Component name must be specified (under '{parent}')")]
    InvalidComponentName { parent: String },

    #[error("[MES-011] Duplicate component name '{name}' under '{parent}'")]
    DuplicateComponentName { name: String, parent: String },

    #[error("[MES-012] Duplicate component reference '{reference}'")]
    DuplicateReference { reference: String },

    #[error("[MES-013] Unknown data scope '{scope}' used by '{component}'")]
    UnknownDataScope { scope: String, component: String },

    // ═══════════════════════════════════════════
    // RESOLUTION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[MES-020] Invalid path expression '{expression}' on '{component}': {reason}")]
    InvalidPathExpression {
        component: String,
        expression: String,
        reason: String,
    },

    #[error("[MES-021] Unknown component reference '{reference}' in '{expression}' on '{component}'")]
    UnknownComponentReference {
        component: String,
        reference: String,
        expression: String,
    },

    #[error("[MES-022] Field path '{expression}' on root component '{component}' has no parent to resolve against")]
    OrphanFieldPath { component: String, expression: String },

    #[error("[MES-023] Cannot find field definition '{field}' on '{scope}' for '{component}'")]
    UnresolvedFieldDefinition {
        component: String,
        field: String,
        scope: String,
    },

    #[error("[MES-024] Dependency cycle or missing chain: {}{}", format_stuck(.stuck), format_cycle(.cycle))]
    DependencyCycleOrMissingChain {
        stuck: Vec<StuckComponent>,
        cycle: Option<String>,
    },

    #[error("[MES-025] Field '{field}' on '{component}' is read from '{target}', which has no data scope")]
    FieldWithoutDataScope {
        component: String,
        field: String,
        target: String,
    },

    // ═══════════════════════════════════════════
    // SESSION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[MES-030] Component '{reference}' not found in view session")]
    UnknownComponent { reference: String },
}

impl ViewError {
    /// Stable error code, e.g. `MES-024`
    pub fn code(&self) -> &'static str {
        match self {
            ViewError::YamlParse(_) => "MES-001",
            ViewError::Io(_) => "MES-002",
            ViewError::InvalidDataScope { .. } => "MES-003",
            ViewError::UnknownFieldType { .. } => "MES-004",
            ViewError::InvalidComponentName { .. } => "MES-010",
            ViewError::DuplicateComponentName { .. } => "MES-011",
            ViewError::DuplicateReference { .. } => "MES-012",
            ViewError::UnknownDataScope { .. } => "MES-013",
            ViewError::InvalidPathExpression { .. } => "MES-020",
            ViewError::UnknownComponentReference { .. } => "MES-021",
            ViewError::OrphanFieldPath { .. } => "MES-022",
            ViewError::UnresolvedFieldDefinition { .. } => "MES-023",
            ViewError::DependencyCycleOrMissingChain { .. } => "MES-024",
            ViewError::FieldWithoutDataScope { .. } => "MES-025",
            ViewError::UnknownComponent { .. } => "MES-030",
        }
    }

    /// Components that could not be initialized, empty for other errors
    pub fn stuck_components(&self) -> &[StuckComponent] {
        match self {
            ViewError::DependencyCycleOrMissingChain { stuck, .. } => stuck,
            _ => &[],
        }
    }
}

impl FixSuggestion for ViewError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ViewError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            ViewError::Io(_) => Some("Check file path and permissions"),
            ViewError::InvalidDataScope { .. } => Some("Use 'entity' or 'plugin.entity'"),
            ViewError::UnknownFieldType { .. } => Some(
                "Use string, text, integer, decimal, boolean, date, datetime, {enum: [...]}, {belongsTo: entity} or {hasMany: entity, joinField: field}",
            ),
            ViewError::InvalidComponentName { .. } => Some("Give every component a non-empty name"),
            ViewError::DuplicateComponentName { .. } => {
                Some("Rename one of the sibling components")
            }
            ViewError::DuplicateReference { .. } => {
                Some("Use unique reference values within a view")
            }
            ViewError::UnknownDataScope { .. } => {
                Some("Declare the entity in a model file passed with --model")
            }
            ViewError::InvalidPathExpression { .. } => {
                Some("Use 'field', '#{reference}' or '#{reference}.field'")
            }
            ViewError::UnknownComponentReference { .. } => {
                Some("Verify the referenced component exists and check its reference attribute")
            }
            ViewError::OrphanFieldPath { .. } => {
                Some("Use '#{reference}.field' on root components")
            }
            ViewError::UnresolvedFieldDefinition { .. } => {
                Some("Check the field exists on the entity the target component is bound to")
            }
            ViewError::DependencyCycleOrMissingChain { .. } => {
                Some("Remove the circular field/scope dependency between the listed components")
            }
            ViewError::FieldWithoutDataScope { .. } => {
                Some("Set the view's model or bind the target component to an entity")
            }
            ViewError::UnknownComponent { .. } => Some("Use the component reference or its full path"),
        }
    }
}
