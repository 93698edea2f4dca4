//! Resolved view cache
//!
//! Views are resolved once and shared read-only by every session rendering
//! them. Keys are `plugin/view`.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;
use crate::resolver::ResolvedView;

#[derive(Default)]
pub struct ViewCache {
    views: DashMap<String, Arc<ResolvedView>>,
}

fn key(plugin: &str, view: &str) -> String {
    format!("{}/{}", plugin, view)
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin: &str, view: &str) -> Option<Arc<ResolvedView>> {
        self.views
            .get(&key(plugin, view))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached view or resolve and cache it
    ///
    /// `resolve` runs under the entry's shard lock, so it runs at most once
    /// per key; a failed resolution caches nothing.
    pub fn get_or_resolve<F>(&self, plugin: &str, view: &str, resolve: F) -> Result<Arc<ResolvedView>>
    where
        F: FnOnce() -> Result<ResolvedView>,
    {
        let key = key(plugin, view);
        if let Some(cached) = self.views.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }

        let entry = self.views.entry(key).or_try_insert_with(|| {
            debug!(plugin, view, "resolving view");
            resolve().map(Arc::new)
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Insert a resolved view, replacing any previous one
    pub fn insert(&self, resolved: ResolvedView) -> Arc<ResolvedView> {
        let key = key(resolved.view().plugin(), resolved.view().name());
        let resolved = Arc::new(resolved);
        self.views.insert(key, Arc::clone(&resolved));
        resolved
    }

    pub fn invalidate(&self, plugin: &str, view: &str) -> bool {
        self.views.remove(&key(plugin, view)).is_some()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use crate::model::DataModel;
    use crate::resolver::ComponentDependencyResolver;
    use crate::session::ViewSession;
    use crate::view::ViewDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const VIEW: &str = r#"
plugin: basic
name: companies
components:
  - name: window
    type: window
    children:
      - name: grid
        type: grid
"#;

    fn resolve() -> Result<ResolvedView> {
        ComponentDependencyResolver::new(&DataModel::new()).initialize(ViewDefinition::from_yaml(VIEW)?)
    }

    #[test]
    fn resolves_once_and_shares() {
        let cache = Arc::new(ViewCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(thread::spawn(move || {
                let resolved = cache
                    .get_or_resolve("basic", "companies", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        resolve()
                    })
                    .unwrap();
                let mut session = ViewSession::new(resolved);
                session.set_entity_id("window", Some(i)).unwrap();
                session.state("window").unwrap().entity_id
            }));
        }

        let mut ids: Vec<Option<i64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, (0..8).map(Some).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ViewCache::new();
        let err = cache
            .get_or_resolve("basic", "broken", || {
                Err(ViewError::UnknownComponent {
                    reference: "x".into(),
                })
            })
            .unwrap_err();
        assert_eq!(err.code(), "MES-030");
        assert!(cache.get("basic", "broken").is_none());

        cache.get_or_resolve("basic", "broken", resolve).unwrap();
        assert!(cache.get("basic", "broken").is_some());
    }

    #[test]
    fn insert_and_invalidate() {
        let cache = ViewCache::new();
        let resolved = cache.insert(resolve().unwrap());
        assert!(Arc::ptr_eq(&resolved, &cache.get("basic", "companies").unwrap()));
        assert!(cache.invalidate("basic", "companies"));
        assert!(!cache.invalidate("basic", "companies"));
        assert!(cache.is_empty());
    }
}
