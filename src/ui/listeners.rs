//! Window-level listener bookkeeping.
//!
//! Components that need a window listener hold a [`Subscription`]; the host
//! attaches a native handler while at least one subscription of that kind is
//! alive. Dropping the guard deregisters it, so remounting never accumulates
//! handlers.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    Scroll,
    Resize,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    active: HashMap<ListenerKind, Vec<(u64, &'static str)>>,
}

#[derive(Debug, Clone, Default)]
pub struct WindowListeners {
    inner: Arc<Mutex<Registry>>,
}

impl WindowListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: ListenerKind, owner: &'static str) -> Subscription {
        let mut registry = lock(&self.inner);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.active.entry(kind).or_default().push((id, owner));
        Subscription {
            registry: self.inner.clone(),
            kind,
            id,
        }
    }

    pub fn count(&self, kind: ListenerKind) -> usize {
        lock(&self.inner).active.get(&kind).map_or(0, Vec::len)
    }

    pub fn owners(&self, kind: ListenerKind) -> Vec<&'static str> {
        lock(&self.inner)
            .active
            .get(&kind)
            .map(|v| v.iter().map(|(_, owner)| *owner).collect())
            .unwrap_or_default()
    }
}

fn lock(inner: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    // Registry holds plain bookkeeping; a poisoned lock still has consistent data.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct Subscription {
    registry: Arc<Mutex<Registry>>,
    kind: ListenerKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if let Some(list) = registry.active.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
    }
}
