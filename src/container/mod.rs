//! Lazy service container.
//!
//! # Responsibilities
//! - Store factories keyed by string id
//! - Resolve on first `get`, cache the result, return the cache afterwards
//! - Invalidate the cache when a factory is replaced
//!
//! # Design Decisions
//! - No reflection: a service is reachable only through its registered factory
//! - Every successful result is cached, including unit/empty values
//! - Failed resolutions cache nothing and wrap the cause
//! - One container per bridge; not meant to be shared across threads

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{BoxError, BridgeError, BridgeResult};

/// A resolved service value.
pub type Service = Arc<dyn Any + Send + Sync>;

/// A factory producing a service, given access to the container.
pub type Factory = Arc<dyn Fn(&Container) -> Result<Service, BoxError> + Send + Sync>;

struct Entry {
    factory: Factory,
    cached: Option<Service>,
}

/// Registry resolving ids to lazily constructed, cached services.
#[derive(Default)]
pub struct Container {
    entries: RefCell<Vec<(String, Entry)>>,
    resolving: RefCell<Vec<String>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `id`, discarding any cached value for `id`.
    pub fn set<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Result<Service, BoxError> + Send + Sync + 'static,
    {
        let id = id.into();
        let entry = Entry {
            factory: Arc::new(factory),
            cached: None,
        };
        let entries = self.entries.get_mut();
        match entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => {
                tracing::trace!(service = %id, "Service factory replaced");
                *slot = entry;
            }
            None => entries.push((id, entry)),
        }
    }

    /// Register a ready-made value under `id`.
    pub fn set_value<T: Any + Send + Sync>(&mut self, id: impl Into<String>, value: T) {
        let value: Service = Arc::new(value);
        self.set(id, move |_| Ok(value.clone()));
    }

    /// True if a factory is registered for `id`. Never resolves.
    pub fn has(&self, id: &str) -> bool {
        self.entries.borrow().iter().any(|(existing, _)| existing == id)
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Resolve `id`, invoking its factory on first access only.
    pub fn get(&self, id: &str) -> BridgeResult<Service> {
        let factory = {
            let entries = self.entries.borrow();
            let (_, entry) = entries
                .iter()
                .find(|(existing, _)| existing == id)
                .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;
            if let Some(cached) = &entry.cached {
                tracing::trace!(service = %id, "Service served from cache");
                return Ok(cached.clone());
            }
            entry.factory.clone()
        };

        if self.resolving.borrow().iter().any(|r| r == id) {
            let chain = self.resolving.borrow().join(" -> ");
            return Err(BridgeError::Container {
                id: id.to_string(),
                source: format!("circular dependency: {chain} -> {id}").into(),
            });
        }

        // No borrow is held while the factory runs; it may call `get`.
        let result = {
            let _guard = ResolvingGuard::enter(&self.resolving, id);
            factory(self)
        };

        let value = match result {
            Ok(value) => value,
            Err(source) => {
                tracing::warn!(service = %id, error = %source, "Service factory failed");
                return Err(BridgeError::Container {
                    id: id.to_string(),
                    source,
                });
            }
        };

        if let Some((_, entry)) = self
            .entries
            .borrow_mut()
            .iter_mut()
            .find(|(existing, _)| existing == id)
        {
            entry.cached = Some(value.clone());
        }
        tracing::debug!(service = %id, "Service resolved");
        Ok(value)
    }
}

/// Marks `id` as being resolved; unmarks it on drop, including unwinding.
struct ResolvingGuard<'a> {
    resolving: &'a RefCell<Vec<String>>,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(resolving: &'a RefCell<Vec<String>>, id: &str) -> Self {
        resolving.borrow_mut().push(id.to_string());
        Self { resolving }
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.resolving.borrow_mut().pop();
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("ids", &self.ids()).finish()
    }
}
