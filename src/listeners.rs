//! Listener edges recorded while resolving a view
//!
//! An edge `source -(field)-> listener` says: when the entity id behind
//! `source` changes, `listener` must be told. The registry is built once by
//! the resolver and read-only afterwards; live per-session wiring happens in
//! [`crate::session`].

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;

use crate::view::ComponentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenerKind {
    /// Listener reads its value through the source (`field` path)
    Field,
    /// Listener is filtered by the source (`scope` path)
    Scope,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerEdge {
    pub source: ComponentId,
    pub kind: ListenerKind,
    pub field: Option<Arc<str>>,
    pub listener: ComponentId,
}

#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    edges: Vec<ListenerEdge>,
    seen: FxHashSet<ListenerEdge>,
    by_source: FxHashMap<ComponentId, SmallVec<[usize; 4]>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge; returns false if the same edge was already recorded
    pub fn record(&mut self, edge: ListenerEdge) -> bool {
        if !self.seen.insert(edge.clone()) {
            return false;
        }
        self.by_source
            .entry(edge.source)
            .or_default()
            .push(self.edges.len());
        self.edges.push(edge);
        true
    }

    /// All edges in recording order
    pub fn edges(&self) -> &[ListenerEdge] {
        &self.edges
    }

    /// Edges whose source is `source`, in recording order
    pub fn listeners_of(&self, source: ComponentId) -> impl Iterator<Item = &ListenerEdge> {
        self.by_source
            .get(&source)
            .into_iter()
            .flat_map(move |indices| indices.iter().map(move |&i| &self.edges[i]))
    }

    pub fn field_listeners(&self, source: ComponentId) -> impl Iterator<Item = &ListenerEdge> {
        self.listeners_of(source)
            .filter(|edge| edge.kind == ListenerKind::Field)
    }

    pub fn scope_listeners(&self, source: ComponentId) -> impl Iterator<Item = &ListenerEdge> {
        self.listeners_of(source)
            .filter(|edge| edge.kind == ListenerKind::Scope)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
