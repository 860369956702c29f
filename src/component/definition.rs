use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::input::Input;
use super::Scope;
use crate::error::BoxError;
use crate::node::RenderTree;
use crate::reactive::Stream;
use crate::types::{Callback, Value};

/// Signature of a component's render function.
pub type RenderFn = dyn Fn(&Input, &Scope) -> Result<Stream<RenderTree>, BoxError>;

/// Shared component reference. Two references denote the same component only
/// if they point at the same definition.
pub type ComponentRef = Rc<ComponentDef>;

/// A component: a render function invoked once per mount, plus declared
/// defaults and an optional placeholder.
pub struct ComponentDef {
    name: String,
    render: Box<RenderFn>,
    defaults: IndexMap<String, Value>,
    placeholder: Option<Box<dyn Fn() -> RenderTree>>,
}

impl ComponentDef {
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&Input, &Scope) -> Result<Stream<RenderTree>, BoxError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            render: Box::new(render),
            defaults: IndexMap::new(),
            placeholder: None,
        }
    }

    /// Component rendered from its resolved prop record.
    ///
    /// `render` runs again only when the record changes. Callback props are
    /// kept stable across records: `render` sees one callback per prop name
    /// that always forwards to the latest closure, so passing a new closure
    /// alone does not re-render.
    pub fn from_render(
        name: impl Into<String>,
        render: impl Fn(&IndexMap<String, Value>) -> RenderTree + 'static,
    ) -> Self {
        let render = Rc::new(render);
        Self::new(name, move |input, _scope| {
            let render = render.clone();
            let last: RefCell<Option<(IndexMap<String, Value>, RenderTree)>> = RefCell::new(None);
            let callbacks = StableCallbacks::default();
            Ok(input.all().map(move |props| {
                let props = callbacks.stabilize(props);
                let mut last = last.borrow_mut();
                if let Some((previous, tree)) = last.as_ref() {
                    if *previous == props {
                        return tree.clone();
                    }
                }
                let tree = render(&props);
                *last = Some((props, tree.clone()));
                tree
            }))
        })
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Content shown while the component is pending.
    pub fn with_placeholder(mut self, placeholder: impl Fn() -> RenderTree + 'static) -> Self {
        self.placeholder = Some(Box::new(placeholder));
        self
    }

    pub fn build(self) -> ComponentRef {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub(crate) fn placeholder(&self) -> RenderTree {
        self.placeholder.as_ref().map_or(RenderTree::Empty, |placeholder| placeholder())
    }

    pub(crate) fn invoke(&self, input: &Input, scope: &Scope) -> Result<Stream<RenderTree>, BoxError> {
        (self.render)(input, scope)
    }
}

/// Per-name callbacks that forward to the most recent closure.
#[derive(Default)]
struct StableCallbacks {
    slots: RefCell<HashMap<String, (Callback, Rc<RefCell<Callback>>)>>,
}

impl StableCallbacks {
    fn stabilize(&self, mut props: IndexMap<String, Value>) -> IndexMap<String, Value> {
        let mut slots = self.slots.borrow_mut();
        for (name, value) in props.iter_mut() {
            let Value::Callback(callback) = value else {
                continue;
            };
            let (stable, latest) = slots.entry(name.clone()).or_insert_with(|| {
                let latest = Rc::new(RefCell::new(callback.clone()));
                let target = latest.clone();
                let stable = Callback::new(move |event| {
                    let current = target.borrow().clone();
                    current.call(event);
                });
                (stable, latest)
            });
            *latest.borrow_mut() = callback.clone();
            *callback = stable.clone();
        }
        props
    }
}

impl PartialEq for ComponentDef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("placeholder", &self.placeholder.is_some())
            .finish()
    }
}
