//! View definition: the registered, indexed set of component declarations
//!
//! Declarations are collected first (from a descriptor or through
//! [`ViewDefinitionBuilder`]) and registered in one step by `build()`.
//! Nothing registers itself as a side effect of construction.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::declaration::{ComponentDeclaration, ComponentDescriptor, ViewDescriptor};
use crate::error::{Result, ViewError};
use crate::interner::intern;
use crate::model::DataScope;

/// Index of a registered component within its view (declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Children: most components have only a handful
pub type ChildVec = SmallVec<[ComponentId; 4]>;

#[derive(Debug, Clone)]
pub struct RegisteredComponent {
    pub id: ComponentId,
    pub parent: Option<ComponentId>,
    /// Dotted path from the root (`window.form.number`)
    pub path: Arc<str>,
    /// Path with layout components left out, used for translations
    pub functional_path: Arc<str>,
    /// Explicit reference or, when absent, the path
    pub reference: Arc<str>,
    pub declaration: ComponentDeclaration,
    children: ChildVec,
}

impl RegisteredComponent {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn is_layout(&self) -> bool {
        self.declaration.kind.is_layout()
    }
}

#[derive(Debug, Clone)]
pub struct ViewDefinition {
    plugin: Arc<str>,
    name: Arc<str>,
    root_scope: Option<DataScope>,
    menu_accessible: bool,
    components: Vec<RegisteredComponent>,
    by_reference: FxHashMap<Arc<str>, ComponentId>,
    by_path: FxHashMap<Arc<str>, ComponentId>,
    roots: Vec<ComponentId>,
}

impl ViewDefinition {
    /// Register every component of a YAML descriptor (pre-order)
    pub fn from_descriptor(descriptor: ViewDescriptor) -> Result<Self> {
        let mut builder = ViewDefinitionBuilder::new(&descriptor.plugin, &descriptor.name)
            .menu_accessible(descriptor.menu_accessible);

        if let Some(ref model) = descriptor.model {
            builder = builder.root_scope(DataScope::parse(&descriptor.plugin, model)?);
        }

        fn add_tree(
            builder: &mut ViewDefinitionBuilder,
            parent: Option<ComponentId>,
            descriptor: ComponentDescriptor,
        ) {
            let (declaration, children) = descriptor.into_parts();
            let id = builder.add(parent, declaration);
            for child in children {
                add_tree(builder, Some(id), child);
            }
        }

        for component in descriptor.components {
            add_tree(&mut builder, None, component);
        }

        builder.build()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_descriptor(ViewDescriptor::from_yaml(yaml)?)
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_scope(&self) -> Option<&DataScope> {
        self.root_scope.as_ref()
    }

    pub fn menu_accessible(&self) -> bool {
        self.menu_accessible
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All components in declaration order
    pub fn components(&self) -> &[RegisteredComponent] {
        &self.components
    }

    #[inline]
    pub fn component(&self, id: ComponentId) -> &RegisteredComponent {
        &self.components[id.0]
    }

    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    pub fn resolve_by_reference(&self, reference: &str) -> Option<ComponentId> {
        self.by_reference.get(reference).copied()
    }

    pub fn component_by_path(&self, path: &str) -> Option<ComponentId> {
        self.by_path.get(path).copied()
    }
}

/// Collects declarations, then registers them all at once
pub struct ViewDefinitionBuilder {
    plugin: Arc<str>,
    name: Arc<str>,
    root_scope: Option<DataScope>,
    menu_accessible: bool,
    pending: Vec<(Option<ComponentId>, ComponentDeclaration)>,
}

impl ViewDefinitionBuilder {
    pub fn new(plugin: &str, name: &str) -> Self {
        Self {
            plugin: intern(plugin),
            name: intern(name),
            root_scope: None,
            menu_accessible: true,
            pending: Vec::new(),
        }
    }

    pub fn root_scope(mut self, scope: DataScope) -> Self {
        self.root_scope = Some(scope);
        self
    }

    pub fn menu_accessible(mut self, accessible: bool) -> Self {
        self.menu_accessible = accessible;
        self
    }

    /// Queue a declaration under `parent` (an id returned by this builder)
    pub fn add(&mut self, parent: Option<ComponentId>, declaration: ComponentDeclaration) -> ComponentId {
        let id = ComponentId(self.pending.len());
        self.pending.push((parent, declaration));
        id
    }

    /// Validate names and references and build the indexes
    pub fn build(self) -> Result<ViewDefinition> {
        let capacity = self.pending.len();
        let mut components: Vec<RegisteredComponent> = Vec::with_capacity(capacity);
        let mut by_reference: FxHashMap<Arc<str>, ComponentId> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut by_path: FxHashMap<Arc<str>, ComponentId> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut sibling_names: FxHashSet<(Option<ComponentId>, Arc<str>)> = FxHashSet::default();
        // Prefix children use for their functional path; None below root-level layouts
        let mut functional_bases: Vec<Option<Arc<str>>> = Vec::with_capacity(capacity);
        let mut roots = Vec::new();

        for (index, (parent, declaration)) in self.pending.into_iter().enumerate() {
            let id = ComponentId(index);

            let parent = match parent {
                Some(p) if p.0 < index => Some(p),
                Some(p) => {
                    return Err(ViewError::UnknownComponent {
                        reference: format!("#{}", p.0),
                    })
                }
                None => None,
            };
            let parent_path = parent.map(|p| Arc::clone(&components[p.0].path));

            if declaration.name.trim().is_empty() {
                return Err(ViewError::InvalidComponentName {
                    parent: parent_path.as_deref().unwrap_or("<root>").to_string(),
                });
            }

            if !sibling_names.insert((parent, Arc::clone(&declaration.name))) {
                return Err(ViewError::DuplicateComponentName {
                    name: declaration.name.to_string(),
                    parent: parent_path.as_deref().unwrap_or("<root>").to_string(),
                });
            }

            let path = match parent_path {
                Some(ref p) => intern(&format!("{}.{}", p, declaration.name)),
                None => Arc::clone(&declaration.name),
            };

            let functional_path = match parent.and_then(|p| functional_bases[p.0].clone()) {
                Some(base) => intern(&format!("{}.{}", base, declaration.name)),
                None => Arc::clone(&declaration.name),
            };
            let base = if declaration.kind.is_layout() {
                parent.and_then(|p| functional_bases[p.0].clone())
            } else {
                Some(Arc::clone(&functional_path))
            };
            functional_bases.push(base);

            let reference = declaration
                .reference
                .clone()
                .unwrap_or_else(|| Arc::clone(&path));
            if by_reference.insert(Arc::clone(&reference), id).is_some() {
                return Err(ViewError::DuplicateReference {
                    reference: reference.to_string(),
                });
            }
            by_path.insert(Arc::clone(&path), id);

            match parent {
                Some(p) => components[p.0].children.push(id),
                None => roots.push(id),
            }

            components.push(RegisteredComponent {
                id,
                parent,
                path,
                functional_path,
                reference,
                declaration,
                children: ChildVec::new(),
            });
        }

        Ok(ViewDefinition {
            plugin: self.plugin,
            name: self.name,
            root_scope: self.root_scope,
            menu_accessible: self.menu_accessible,
            components,
            by_reference,
            by_path,
            roots,
        })
    }
}
