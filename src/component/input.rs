//! Reactive view of a component's props.
//!
//! The controller owns the prop map and replaces it on every update; the
//! component reads it through streams, so the render function runs once per
//! mount and still observes every prop change.

use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::{signal, Signal};

use crate::node::{PropMap, PropValue};
use crate::reactive::Stream;
use crate::types::Value;

/// Record of prop streams handed to a component's render function.
#[derive(Clone)]
pub struct Input {
    inner: Rc<Inner>,
}

struct Inner {
    props: Signal<PropMap>,
    defaults: IndexMap<String, Value>,
    rendered: Signal<bool>,
}

impl Input {
    pub fn new(props: PropMap, defaults: IndexMap<String, Value>) -> Self {
        Self {
            inner: Rc::new(Inner {
                props: signal(props),
                defaults,
                rendered: signal(false),
            }),
        }
    }

    /// Stream of prop `name`.
    ///
    /// Reactive props are unwrapped, static ones are constant. Falls back to
    /// the declared default while the prop is absent or has not emitted.
    /// An absent prop without a default reads as [`Value::Null`].
    pub fn get(&self, name: &str) -> Stream<Value> {
        let default = self.inner.defaults.get(name).cloned();
        self.project(name, default)
    }

    /// Like [`get`](Input::get) with a call-site default.
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Stream<Value> {
        self.project(name, Some(default.into()))
    }

    /// Streams for a fixed set of props.
    pub fn pluck(&self, names: &[&str]) -> IndexMap<String, Stream<Value>> {
        names
            .iter()
            .map(|name| (name.to_string(), self.get(name)))
            .collect()
    }

    /// Stream of the full resolved prop record, defaults included.
    ///
    /// Emits once every reactive prop has a value (or a default).
    pub fn all(&self) -> Stream<IndexMap<String, Value>> {
        let inner = self.inner.clone();
        let pending = self.inner.props.clone();
        Stream::from_fn_opt(move || {
            let props = inner.props.get();
            let mut record = IndexMap::with_capacity(props.len());
            for (name, prop) in &props {
                let value = resolve(Some(prop), inner.defaults.get(name))?;
                record.insert(name.clone(), value);
            }
            for (name, value) in &inner.defaults {
                record.entry(name.clone()).or_insert_with(|| value.clone());
            }
            Some(record)
        })
        .with_pending(move || pending.get().values().any(PropValue::is_pending))
    }

    /// True until the first render output exists, then true while any prop
    /// is pending.
    pub fn pending(&self) -> Stream<bool> {
        let inner = self.inner.clone();
        Stream::from_fn(move || {
            !inner.rendered.get() || inner.props.get().values().any(PropValue::is_pending)
        })
    }

    pub fn is_pending(&self) -> bool {
        !self.inner.rendered.get() || self.inner.props.get().values().any(PropValue::is_pending)
    }

    /// Snapshot of the current prop map.
    pub fn props(&self) -> PropMap {
        self.inner.props.get()
    }

    pub(crate) fn set_props(&self, props: PropMap) {
        self.inner.props.set(props);
    }

    pub(crate) fn mark_rendered(&self) {
        if !self.inner.rendered.get() {
            self.inner.rendered.set(true);
        }
    }

    fn project(&self, name: &str, default: Option<Value>) -> Stream<Value> {
        let props = self.inner.props.clone();
        let pending = self.inner.props.clone();
        let name = name.to_string();
        let key = name.clone();
        Stream::from_fn_opt(move || {
            let props = props.get();
            match props.get(&name) {
                Some(prop) => resolve(Some(prop), default.as_ref()),
                None => Some(default.clone().unwrap_or_default()),
            }
        })
        .with_pending(move || pending.get().get(&key).is_some_and(PropValue::is_pending))
    }
}

fn resolve(prop: Option<&PropValue>, default: Option<&Value>) -> Option<Value> {
    match prop {
        Some(PropValue::Static(value)) => Some(value.clone()),
        Some(PropValue::Stream(stream)) => stream.current().or_else(|| default.cloned()),
        None => default.cloned(),
    }
}
