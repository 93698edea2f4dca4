//! Per-session runtime state of a resolved view
//!
//! The resolved view is a shared, read-only template. Each rendering session
//! gets its own [`ViewSession`] holding mutable component state, and wires the
//! template's listener edges into live change propagation.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::declaration::CustomEventBinding;
use crate::error::{Result, ViewError};
use crate::listeners::ListenerKind;
use crate::resolver::ResolvedView;
use crate::view::ComponentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentState {
    pub reference: Arc<str>,
    pub enabled: bool,
    pub visible: bool,
    /// Entity shown by the component itself (forms, lookups, whole-component bindings)
    pub entity_id: Option<i64>,
    /// Entity of the component this one reads its field from
    pub source_entity_id: Option<i64>,
    /// Entity filtering this component's data
    pub scope_entity_id: Option<i64>,
    pub value: Option<String>,
}

/// One listener notified during a change propagation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub source: Arc<str>,
    pub listener: Arc<str>,
    pub kind: ListenerKind,
    pub field: Option<Arc<str>>,
    pub entity_id: Option<i64>,
}

pub struct ViewSession {
    view: Arc<ResolvedView>,
    states: FxHashMap<ComponentId, ComponentState>,
}

impl ViewSession {
    /// Instantiate state for every non-layout component
    pub fn new(view: Arc<ResolvedView>) -> Self {
        let states = view
            .view()
            .components()
            .iter()
            .filter(|c| !c.is_layout())
            .map(|c| {
                (
                    c.id,
                    ComponentState {
                        reference: Arc::clone(&c.reference),
                        enabled: c.declaration.default_enabled,
                        visible: c.declaration.default_visible,
                        entity_id: None,
                        source_entity_id: None,
                        scope_entity_id: None,
                        value: None,
                    },
                )
            })
            .collect();

        Self { view, states }
    }

    pub fn view(&self) -> &ResolvedView {
        &self.view
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Find a stateful component by reference, falling back to its path
    fn lookup(&self, reference: &str) -> Result<ComponentId> {
        let view = self.view.view();
        view.resolve_by_reference(reference)
            .or_else(|| view.component_by_path(reference))
            .filter(|id| self.states.contains_key(id))
            .ok_or_else(|| ViewError::UnknownComponent {
                reference: reference.to_string(),
            })
    }

    fn state_mut(&mut self, reference: &str) -> Result<&mut ComponentState> {
        let id = self.lookup(reference)?;
        self.states
            .get_mut(&id)
            .ok_or_else(|| ViewError::UnknownComponent {
                reference: reference.to_string(),
            })
    }

    pub fn state(&self, reference: &str) -> Result<&ComponentState> {
        let id = self.lookup(reference)?;
        self.states
            .get(&id)
            .ok_or_else(|| ViewError::UnknownComponent {
                reference: reference.to_string(),
            })
    }

    pub fn set_value(&mut self, reference: &str, value: Option<String>) -> Result<()> {
        self.state_mut(reference)?.value = value;
        Ok(())
    }

    pub fn set_enabled(&mut self, reference: &str, enabled: bool) -> Result<()> {
        self.state_mut(reference)?.enabled = enabled;
        Ok(())
    }

    pub fn set_visible(&mut self, reference: &str, visible: bool) -> Result<()> {
        self.state_mut(reference)?.visible = visible;
        Ok(())
    }

    /// Handlers bound to `event` on a component, in declaration order
    pub fn handlers_for(&self, reference: &str, event: &str) -> Result<Vec<&CustomEventBinding>> {
        let id = self.lookup(reference)?;
        Ok(self
            .view
            .view()
            .component(id)
            .declaration
            .custom_events
            .iter()
            .filter(|binding| binding.event == event)
            .collect())
    }

    /// Change the entity behind a component and notify its listeners
    ///
    /// Field listeners bound to the whole component (`#{ref}`) show the same
    /// entity and propagate further; listeners bound to one of its fields,
    /// and scope listeners, are updated without propagating. Every component
    /// propagates at most once per call.
    pub fn set_entity_id(&mut self, reference: &str, entity_id: Option<i64>) -> Result<Vec<ChangeNotification>> {
        let start = self.lookup(reference)?;
        if let Some(state) = self.states.get_mut(&start) {
            state.entity_id = entity_id;
        }

        let view = Arc::clone(&self.view);
        let mut notifications = Vec::new();
        let mut visited: FxHashSet<ComponentId> = FxHashSet::default();
        let mut queue: VecDeque<ComponentId> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(source) = queue.pop_front() {
            for edge in view.listeners().listeners_of(source) {
                let Some(listener) = self.states.get_mut(&edge.listener) else {
                    continue;
                };

                match edge.kind {
                    ListenerKind::Field if edge.field.is_none() => {
                        if !visited.insert(edge.listener) {
                            continue;
                        }
                        listener.source_entity_id = entity_id;
                        listener.entity_id = entity_id;
                        queue.push_back(edge.listener);
                    }
                    ListenerKind::Field => listener.source_entity_id = entity_id,
                    ListenerKind::Scope => listener.scope_entity_id = entity_id,
                }

                notifications.push(ChangeNotification {
                    source: Arc::clone(&view.view().component(source).reference),
                    listener: Arc::clone(&listener.reference),
                    kind: edge.kind,
                    field: edge.field.clone(),
                    entity_id,
                });
            }
        }

        debug!(
            component = reference,
            notified = notifications.len(),
            "entity id changed"
        );
        Ok(notifications)
    }
}
