//! Context values handed down the component tree.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::stream::Stream;
use crate::error::{RenderError, Result};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Typed key for a context entry, with the value used when nothing provides it.
pub struct Context<T> {
    id: u64,
    name: &'static str,
    initial: T,
}

impl<T: Clone + PartialEq + 'static> Context<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            name,
            initial,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Chain of context entries. Lookups fall through to the parent map.
#[derive(Clone, Default)]
pub struct ContextMap {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: RefCell<HashMap<u64, Rc<dyn Any>>>,
    parent: Option<ContextMap>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child map that sees every entry of this one and may shadow them.
    pub fn downstream(&self) -> ContextMap {
        ContextMap {
            inner: Rc::new(Inner {
                entries: RefCell::new(HashMap::new()),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn provide<T: Clone + PartialEq + 'static>(&self, context: &Context<T>, value: Stream<T>) {
        self.inner.entries.borrow_mut().insert(context.id, Rc::new(value));
    }

    pub fn require<T: Clone + PartialEq + 'static>(&self, context: &Context<T>) -> Result<Stream<T>> {
        self.lookup(context)
            .ok_or_else(|| RenderError::MissingContext(context.name.to_string()))
    }

    /// Provided stream, or a constant of the context's initial value.
    pub fn optional<T: Clone + PartialEq + 'static>(&self, context: &Context<T>) -> Stream<T> {
        self.lookup(context)
            .unwrap_or_else(|| Stream::constant(context.initial.clone()))
    }

    fn lookup<T: Clone + PartialEq + 'static>(&self, context: &Context<T>) -> Option<Stream<T>> {
        let mut map = Some(self);
        while let Some(current) = map {
            let found = current
                .inner
                .entries
                .borrow()
                .get(&context.id)
                .and_then(|entry| entry.downcast_ref::<Stream<T>>().cloned());
            if found.is_some() {
                return found;
            }
            map = current.inner.parent.as_ref();
        }
        None
    }
}

impl fmt::Debug for ContextMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMap")
            .field("entries", &self.inner.entries.borrow().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
