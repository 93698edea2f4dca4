//! Component dependency resolver
//!
//! Initializes every component of a view strictly after the components it
//! depends on, using fixpoint passes over the pending set:
//!
//! 1. On its first attempt a component parses its field/scope path
//!    expressions, resolves their targets and records listener edges on them.
//! 2. It completes once every target (and, without any path, its parent) is
//!    initialized; its data scope and field definitions are derived then.
//! 3. Passes repeat until nothing is pending. A pass that initializes nothing
//!    while components remain pending is a dependency cycle or missing chain.
//!
//! Passes visit pending components in declaration order and a component sees
//! targets completed earlier in the same pass, so results are deterministic.

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::error::{Result, StuckComponent, ViewError};
use crate::listeners::{ListenerEdge, ListenerKind, ListenerRegistry};
use crate::model::{DataDefinitions, DataScope, FieldType};
use crate::path_expr::{parse_path_expression, ResolvedBinding};
use crate::view::{ComponentId, RegisteredComponent, ViewDefinition};

/// Field a component is bound to, within a data scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldScope {
    pub data_scope: DataScope,
    pub field: Arc<str>,
    pub field_type: FieldType,
}

/// Resolution result for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNode {
    pub id: ComponentId,
    pub field_binding: Option<ResolvedBinding>,
    pub scope_binding: Option<ResolvedBinding>,
    /// Entity the component reads from / writes to
    pub data_scope: Option<DataScope>,
    pub field: Option<FieldScope>,
    pub scope_field: Option<FieldScope>,
}

/// Fully initialized view, immutable and shareable across sessions
#[derive(Debug, Clone)]
pub struct ResolvedView {
    view: ViewDefinition,
    nodes: Vec<ComponentNode>,
    listeners: ListenerRegistry,
    order: Vec<ComponentId>,
    passes: usize,
    js_file_paths: Vec<String>,
}

impl ResolvedView {
    pub fn view(&self) -> &ViewDefinition {
        &self.view
    }

    /// Nodes indexed like the view's components
    pub fn nodes(&self) -> &[ComponentNode] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, id: ComponentId) -> &ComponentNode {
        &self.nodes[id.index()]
    }

    pub fn node_by_reference(&self, reference: &str) -> Option<&ComponentNode> {
        self.view
            .resolve_by_reference(reference)
            .map(|id| self.node(id))
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Components in the order they completed initialization
    pub fn initialization_order(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Client scripts needed by the view, sorted and de-duplicated
    pub fn js_file_paths(&self) -> &[String] {
        &self.js_file_paths
    }
}

#[derive(Debug, Clone)]
struct Target {
    component: ComponentId,
    binding: ResolvedBinding,
}

/// What a component waits for, fixed on its first attempt
#[derive(Debug, Clone)]
struct Dependencies {
    field: Option<Target>,
    scope: Option<Target>,
    /// Parent, when the data scope is inherited from it
    parent: Option<ComponentId>,
}

impl Dependencies {
    fn components(&self) -> SmallVec<[ComponentId; 3]> {
        let mut deps = SmallVec::new();
        if let Some(ref t) = self.field {
            deps.push(t.component);
        }
        if let Some(ref t) = self.scope {
            deps.push(t.component);
        }
        if let Some(p) = self.parent {
            deps.push(p);
        }
        deps
    }
}

#[derive(Debug, Default)]
struct NodeState {
    dependencies: Option<Dependencies>,
    initialized: bool,
    data_scope: Option<DataScope>,
    field: Option<FieldScope>,
    scope_field: Option<FieldScope>,
}

/// Resolves data scopes, field definitions and listener edges of a view
pub struct ComponentDependencyResolver<'m, D: ?Sized> {
    model: &'m D,
}

impl<'m, D: DataDefinitions + ?Sized> ComponentDependencyResolver<'m, D> {
    pub fn new(model: &'m D) -> Self {
        Self { model }
    }

    /// Initialize every component of `view`, or fail without partial results
    pub fn initialize(&self, view: ViewDefinition) -> Result<ResolvedView> {
        if let Some(scope) = view.root_scope() {
            if !self.model.contains(scope) {
                return Err(ViewError::UnknownDataScope {
                    scope: scope.to_string(),
                    component: format!("{}/{}", view.plugin(), view.name()),
                });
            }
        }

        let mut states: Vec<NodeState> = Vec::with_capacity(view.len());
        states.resize_with(view.len(), NodeState::default);
        let mut listeners = ListenerRegistry::new();
        let mut order: Vec<ComponentId> = Vec::with_capacity(view.len());
        let mut pending: Vec<ComponentId> = view.components().iter().map(|c| c.id).collect();
        let mut passes = 0;

        while !pending.is_empty() {
            passes += 1;
            let completed_before = order.len();
            let mut still_pending = Vec::with_capacity(pending.len());

            for id in pending {
                if states[id.index()].dependencies.is_none() {
                    let deps = self.attempt(&view, id, &mut listeners)?;
                    states[id.index()].dependencies = Some(deps);
                }

                let ready = states[id.index()]
                    .dependencies
                    .as_ref()
                    .is_some_and(|deps| {
                        deps.components()
                            .iter()
                            .all(|dep| states[dep.index()].initialized)
                    });

                if ready {
                    self.complete(&view, id, &mut states)?;
                    debug!(pass = passes, component = %view.component(id).path, "component initialized");
                    order.push(id);
                } else {
                    still_pending.push(id);
                }
            }

            if order.len() == completed_before {
                let err = stalled(&view, &still_pending, &states);
                warn!(view = %view.name(), pending = still_pending.len(), "initialization stalled");
                return Err(err);
            }
            pending = still_pending;
        }

        let js_file_paths: BTreeSet<String> = view
            .components()
            .iter()
            .map(|c| c.declaration.kind.js_file_path())
            .collect();

        let nodes = states
            .into_iter()
            .enumerate()
            .map(|(index, state)| {
                let id = view.components()[index].id;
                let deps = state.dependencies.unwrap_or(Dependencies {
                    field: None,
                    scope: None,
                    parent: None,
                });
                ComponentNode {
                    id,
                    field_binding: deps.field.map(|t| t.binding),
                    scope_binding: deps.scope.map(|t| t.binding),
                    data_scope: state.data_scope,
                    field: state.field,
                    scope_field: state.scope_field,
                }
            })
            .collect();

        info!(
            view = %view.name(),
            components = view.len(),
            listeners = listeners.len(),
            passes,
            "view initialized"
        );

        Ok(ResolvedView {
            view,
            nodes,
            listeners,
            order,
            passes,
            js_file_paths: js_file_paths.into_iter().collect(),
        })
    }

    /// First attempt: parse paths, resolve targets, record listener edges
    fn attempt(
        &self,
        view: &ViewDefinition,
        id: ComponentId,
        listeners: &mut ListenerRegistry,
    ) -> Result<Dependencies> {
        let component = view.component(id);
        let declaration = &component.declaration;

        let field = declaration
            .field_path
            .as_deref()
            .map(|expr| resolve_target(view, component, expr))
            .transpose()?;
        let scope = declaration
            .scope_field_path
            .as_deref()
            .map(|expr| resolve_target(view, component, expr))
            .transpose()?;

        if let Some(ref target) = field {
            listeners.record(ListenerEdge {
                source: target.component,
                kind: ListenerKind::Field,
                field: target.binding.field.clone(),
                listener: id,
            });
        }
        if let Some(ref target) = scope {
            listeners.record(ListenerEdge {
                source: target.component,
                kind: ListenerKind::Scope,
                field: target.binding.field.clone(),
                listener: id,
            });
        }

        let parent = if field.is_none() && scope.is_none() {
            component.parent
        } else {
            None
        };

        Ok(Dependencies {
            field,
            scope,
            parent,
        })
    }

    /// Derive data scope and field definitions once all dependencies are ready
    fn complete(&self, view: &ViewDefinition, id: ComponentId, states: &mut [NodeState]) -> Result<()> {
        let component = view.component(id);
        let Some(deps) = states[id.index()].dependencies.clone() else {
            return Ok(());
        };

        let mut data_scope = if let Some(ref t) = deps.field {
            states[t.component.index()].data_scope.clone()
        } else if let Some(ref t) = deps.scope {
            states[t.component.index()].data_scope.clone()
        } else if let Some(parent) = component.parent {
            states[parent.index()].data_scope.clone()
        } else {
            view.root_scope().cloned()
        };

        let field = match deps.field {
            Some(ref t) => self.field_definition(view, component, t, states)?,
            None => None,
        };
        let scope_field = match deps.scope {
            Some(ref t) => self.field_definition(view, component, t, states)?,
            None => None,
        };

        // Relations narrow the scope to the related entity
        if let Some(target) = field
            .as_ref()
            .or(scope_field.as_ref())
            .and_then(|f| f.field_type.relation_target())
        {
            data_scope = Some(target.clone());
        }

        let state = &mut states[id.index()];
        state.data_scope = data_scope;
        state.field = field;
        state.scope_field = scope_field;
        state.initialized = true;
        Ok(())
    }

    /// Look up the bound field on the target's data scope
    fn field_definition(
        &self,
        view: &ViewDefinition,
        component: &RegisteredComponent,
        target: &Target,
        states: &[NodeState],
    ) -> Result<Option<FieldScope>> {
        let Some(field) = target.binding.field.clone() else {
            return Ok(None);
        };
        let Some(scope) = states[target.component.index()].data_scope.clone() else {
            return Err(ViewError::FieldWithoutDataScope {
                component: component.path.to_string(),
                field: field.to_string(),
                target: view.component(target.component).reference.to_string(),
            });
        };

        if !self.model.contains(&scope) {
            return Err(ViewError::UnknownDataScope {
                scope: scope.to_string(),
                component: component.path.to_string(),
            });
        }

        let field_type = self
            .model
            .field(&scope, &field)
            .cloned()
            .ok_or_else(|| ViewError::UnresolvedFieldDefinition {
                component: component.path.to_string(),
                field: field.to_string(),
                scope: scope.to_string(),
            })?;

        Ok(Some(FieldScope {
            data_scope: scope,
            field,
            field_type,
        }))
    }
}

fn resolve_target(view: &ViewDefinition, component: &RegisteredComponent, expression: &str) -> Result<Target> {
    let binding = parse_path_expression(&component.path, expression)?;

    let target = match binding.target() {
        Some(reference) => view.resolve_by_reference(reference).ok_or_else(|| {
            ViewError::UnknownComponentReference {
                component: component.path.to_string(),
                reference: reference.to_string(),
                expression: expression.to_string(),
            }
        })?,
        None => component.parent.ok_or_else(|| ViewError::OrphanFieldPath {
            component: component.path.to_string(),
            expression: expression.to_string(),
        })?,
    };

    Ok(Target {
        component: target,
        binding,
    })
}

/// Build the stall error: every stuck component plus one cycle if present
fn stalled(view: &ViewDefinition, pending: &[ComponentId], states: &[NodeState]) -> ViewError {
    let mut waiting: FxHashMap<ComponentId, SmallVec<[ComponentId; 3]>> = FxHashMap::default();

    let stuck = pending
        .iter()
        .map(|&id| {
            let mut blockers: SmallVec<[ComponentId; 3]> = states[id.index()]
                .dependencies
                .as_ref()
                .map(Dependencies::components)
                .unwrap_or_default()
                .into_iter()
                .filter(|dep| !states[dep.index()].initialized)
                .collect();
            blockers.dedup();
            let waiting_on = blockers
                .iter()
                .map(|dep| view.component(*dep).reference.to_string())
                .collect();
            waiting.insert(id, blockers);

            StuckComponent {
                reference: view.component(id).reference.to_string(),
                waiting_on,
            }
        })
        .collect();

    let cycle = find_cycle(pending, &waiting).map(|ids| {
        ids.iter()
            .map(|id| view.component(*id).reference.to_string())
            .collect::<Vec<_>>()
            .join(" → ")
    });

    ViewError::DependencyCycleOrMissingChain { stuck, cycle }
}

/// Three-color DFS over the waits-on edges; returns the cycle closed on its start
///
/// Iterative with an explicit frame stack, so long stuck chains cannot
/// exhaust the call stack.
fn find_cycle(
    pending: &[ComponentId],
    waiting: &FxHashMap<ComponentId, SmallVec<[ComponentId; 3]>>,
) -> Option<Vec<ComponentId>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors: FxHashMap<ComponentId, Color> =
        pending.iter().map(|&id| (id, Color::White)).collect();
    // (node, index of the next dependency to visit)
    let mut frames: Vec<(ComponentId, usize)> = Vec::new();
    let mut path: Vec<ComponentId> = Vec::new();

    for &root in pending {
        if colors.get(&root) != Some(&Color::White) {
            continue;
        }
        colors.insert(root, Color::Gray);
        frames.push((root, 0));
        path.push(root);

        while let Some(frame) = frames.last_mut() {
            let (node, next) = *frame;
            let dep = waiting.get(&node).and_then(|deps| deps.get(next)).copied();

            let Some(dep) = dep else {
                frames.pop();
                path.pop();
                colors.insert(node, Color::Black);
                continue;
            };
            frame.1 += 1;

            match colors.get(&dep).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let start = path.iter().position(|&x| x == dep).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Color::White => {
                    colors.insert(dep, Color::Gray);
                    frames.push((dep, 0));
                    path.push(dep);
                }
                Color::Black => {}
            }
        }
    }
    None
}
