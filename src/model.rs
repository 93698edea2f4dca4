//! Data definitions the view layer binds to
//!
//! A stand-in for the ORM's data-definition layer: just enough structure
//! (entities, fields, relation targets) for components to resolve the data
//! scope they read from and the field they are bound to.
//!
//! Model documents are YAML:
//!
//! ```yaml
//! plugin: materialFlowResources
//! entities:
//!   document:
//!     fields:
//!       number: string
//!       state: { enum: [draft, accepted] }
//!       locationFrom: { belongsTo: location }
//!       positions: { hasMany: position, joinField: document }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, ViewError};
use crate::interner::intern;

/// Opaque handle naming the entity a component reads from (`plugin.entity`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataScope {
    plugin: Arc<str>,
    entity: Arc<str>,
}

impl DataScope {
    pub fn new(plugin: &str, entity: &str) -> Self {
        Self {
            plugin: intern(plugin),
            entity: intern(entity),
        }
    }

    /// Parse `entity` (relative to `default_plugin`) or `plugin.entity`
    pub fn parse(default_plugin: &str, raw: &str) -> Result<Self> {
        let invalid = || ViewError::InvalidDataScope {
            raw: raw.to_string(),
        };

        let raw_trimmed = raw.trim();
        let (plugin, entity) = match raw_trimmed.split_once('.') {
            Some((plugin, entity)) => (plugin, entity),
            None => (default_plugin, raw_trimmed),
        };

        let valid = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
        };
        if !valid(plugin) || !valid(entity) {
            return Err(invalid());
        }

        Ok(Self::new(plugin, entity))
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.plugin, self.entity)
    }
}

impl Serialize for DataScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Enum { values: Vec<String> },
    BelongsTo { target: DataScope },
    HasMany { target: DataScope, join_field: Arc<str> },
}

impl FieldType {
    /// Entity a relation field points at; `None` for plain value fields
    pub fn relation_target(&self) -> Option<&DataScope> {
        match self {
            FieldType::BelongsTo { target } | FieldType::HasMany { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Enum { .. } => "enum",
            FieldType::BelongsTo { .. } => "belongsTo",
            FieldType::HasMany { .. } => "hasMany",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataDefinition {
    scope: DataScope,
    fields: Vec<(Arc<str>, FieldType)>,
    index: FxHashMap<Arc<str>, usize>,
}

impl DataDefinition {
    pub fn new(scope: DataScope) -> Self {
        Self {
            scope,
            fields: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Add or replace a field
    pub fn with_field(mut self, name: &str, field_type: FieldType) -> Self {
        let name = intern(name);
        match self.index.get(&name) {
            Some(&i) => self.fields[i].1 = field_type,
            None => {
                self.index.insert(Arc::clone(&name), self.fields.len());
                self.fields.push((name, field_type));
            }
        }
        self
    }

    pub fn scope(&self) -> &DataScope {
        &self.scope
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_ref(), ty))
    }
}

/// Lookup capability over data definitions
///
/// Implemented by [`DataModel`]; a real ORM layer can provide its own.
pub trait DataDefinitions {
    fn contains(&self, scope: &DataScope) -> bool;

    fn field(&self, scope: &DataScope, name: &str) -> Option<&FieldType>;
}

/// Merged set of data definitions loaded from model documents
#[derive(Debug, Clone, Default)]
pub struct DataModel {
    definitions: FxHashMap<DataScope, DataDefinition>,
}

#[derive(Debug, Deserialize)]
struct ModelDocument {
    plugin: String,
    #[serde(default)]
    entities: BTreeMap<String, EntityDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct EntityDocument {
    #[serde(default)]
    fields: BTreeMap<String, FieldDocument>,
}

/// Untagged: relation maps are tried before the plain type name
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldDocument {
    HasMany {
        #[serde(rename = "hasMany")]
        has_many: String,
        #[serde(rename = "joinField")]
        join_field: String,
    },
    BelongsTo {
        #[serde(rename = "belongsTo")]
        belongs_to: String,
    },
    Enum {
        #[serde(rename = "enum")]
        values: Vec<String>,
    },
    Simple(String),
}

impl FieldDocument {
    fn into_field_type(self, plugin: &str, scope: &DataScope, field: &str) -> Result<FieldType> {
        Ok(match self {
            FieldDocument::HasMany {
                has_many,
                join_field,
            } => FieldType::HasMany {
                target: DataScope::parse(plugin, &has_many)?,
                join_field: intern(&join_field),
            },
            FieldDocument::BelongsTo { belongs_to } => FieldType::BelongsTo {
                target: DataScope::parse(plugin, &belongs_to)?,
            },
            FieldDocument::Enum { values } => FieldType::Enum { values },
            FieldDocument::Simple(raw) => match raw.as_str() {
                "string" => FieldType::String,
                "text" => FieldType::Text,
                "integer" => FieldType::Integer,
                "decimal" => FieldType::Decimal,
                "boolean" => FieldType::Boolean,
                "date" => FieldType::Date,
                "datetime" => FieldType::DateTime,
                _ => {
                    return Err(ViewError::UnknownFieldType {
                        raw,
                        field: field.to_string(),
                        scope: scope.to_string(),
                    })
                }
            },
        })
    }
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one model document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: ModelDocument = serde_yaml::from_str(yaml)?;
        let mut model = Self::new();

        for (entity, entity_doc) in document.entities {
            let scope = DataScope::parse(&document.plugin, &entity)?;
            let mut definition = DataDefinition::new(scope.clone());
            for (field, field_doc) in entity_doc.fields {
                let field_type = field_doc.into_field_type(&document.plugin, &scope, &field)?;
                definition = definition.with_field(&field, field_type);
            }
            model.insert(definition);
        }

        Ok(model)
    }

    /// Add a definition, replacing any previous one for the same scope
    pub fn insert(&mut self, definition: DataDefinition) {
        self.definitions
            .insert(definition.scope().clone(), definition);
    }

    /// Merge another model into this one; later definitions win
    pub fn merge(&mut self, other: DataModel) {
        self.definitions.extend(other.definitions);
    }

    pub fn get(&self, scope: &DataScope) -> Option<&DataDefinition> {
        self.definitions.get(scope)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All scopes, sorted
    pub fn scopes(&self) -> Vec<&DataScope> {
        let mut scopes: Vec<&DataScope> = self.definitions.keys().collect();
        scopes.sort();
        scopes
    }
}

impl DataDefinitions for DataModel {
    fn contains(&self, scope: &DataScope) -> bool {
        self.definitions.contains_key(scope)
    }

    fn field(&self, scope: &DataScope, name: &str) -> Option<&FieldType> {
        self.definitions.get(scope)?.field(name)
    }
}
