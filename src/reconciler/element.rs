//! Element controller.
//!
//! Owns one target element. Props are applied by diffing the previous prop
//! map against the next one; the adapter decides which changed names are
//! plain properties and which are event listeners.
//!
//! - Static values are written with `set_property`. A removed prop is
//!   written as [`Value::Null`].
//! - Reactive values get one binding per prop name. The binding subscribes
//!   once to a switchable source, so a new stream for the same prop swaps
//!   the source without re-subscribing the sink. While the source reports
//!   pending, a suspension token owned by that prop is raised.
//! - [`Value::Ref`] props receive the element's handle and are cleared on
//!   unmount.
//! - Event props are attached with `listen`; a reactive listener is read at
//!   dispatch time.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use super::children::Children;
use super::placement::Placement;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{shallow_diff, ElementNode, NodeKind, PropMap, PropValue, RenderNode};
use crate::reactive::{Stream, Subscription};
use crate::types::{Callback, Cleanup, Handle, NodeRef, Value};

enum Binding {
    Reactive {
        source: Signal<Stream<Value>>,
        subscription: Subscription,
    },
    Ref(NodeRef),
    Listener(Cleanup),
}

pub struct ElementController {
    this: Weak<Self>,
    env: Env,
    node: RefCell<ElementNode>,
    handle: Cell<Option<Handle>>,
    placement: Placement,
    bindings: RefCell<HashMap<String, Binding>>,
    children: Rc<Children>,
}

impl ElementController {
    pub fn new(env: Env, node: ElementNode) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            children: Children::new(env.clone()),
            env,
            node: RefCell::new(node),
            handle: Cell::new(None),
            placement: Placement::default(),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    pub fn tag(&self) -> String {
        self.node.borrow().tag.clone()
    }

    /// Target handle, once mounted.
    pub fn element(&self) -> Option<Handle> {
        self.handle.get()
    }

    fn handle(&self) -> Handle {
        self.handle.get().expect("element controller used before mount")
    }

    // =========================================================================
    // Props
    // =========================================================================

    fn apply_props(&self, prev: &PropMap, next: &PropMap) -> Result<()> {
        let changed = shallow_diff(prev, next);
        if changed.is_empty() {
            return Ok(());
        }
        let classified = self.env.adapter.classify_names(&changed);
        for name in &classified.props {
            self.apply_prop(name, next.get(name))?;
        }
        for name in &classified.events {
            self.apply_listener(name, next.get(name));
        }
        Ok(())
    }

    fn apply_prop(&self, name: &str, value: Option<&PropValue>) -> Result<()> {
        let handle = self.handle();
        match value {
            Some(PropValue::Stream(stream)) => {
                let existing = match self.bindings.borrow().get(name) {
                    Some(Binding::Reactive { source, .. }) => Some(source.clone()),
                    _ => None,
                };
                match existing {
                    Some(source) => {
                        source.set(stream.clone());
                    }
                    None => {
                        self.release(name);
                        let binding = self.bind_reactive(name, stream.clone())?;
                        self.bindings.borrow_mut().insert(name.to_string(), binding);
                    }
                }
            }
            Some(PropValue::Static(Value::Ref(node_ref))) => {
                self.release(name);
                node_ref.set(Some(handle));
                self.bindings
                    .borrow_mut()
                    .insert(name.to_string(), Binding::Ref(node_ref.clone()));
            }
            Some(PropValue::Static(value)) => {
                self.release(name);
                self.env.adapter.set_property(handle, name, value);
            }
            None => {
                let had_ref = self.release(name);
                if !had_ref {
                    self.env.adapter.set_property(handle, name, &Value::Null);
                }
            }
        }
        Ok(())
    }

    fn bind_reactive(&self, name: &str, stream: Stream<Value>) -> Result<Binding> {
        let handle = self.handle();
        let source = signal(stream);
        let mut subscription = Subscription::new();

        let values = {
            let source = source.clone();
            Stream::from_fn_opt(move || source.get().current())
        };
        let adapter = self.env.adapter.clone();
        let prop = name.to_string();
        subscription.add_subscription(values.subscribe(&self.env.scheduler, move |value| {
            adapter.set_property(handle, &prop, &value);
            Ok(())
        })?);

        let pending = {
            let source = source.clone();
            Stream::from_fn(move || source.get().is_pending())
        };
        let token = Rc::new(self.env.suspension.downstream());
        let raised = token.clone();
        subscription.add_subscription(pending.subscribe(&self.env.scheduler, move |pending| {
            raised.set(pending);
            Ok(())
        })?);
        subscription.add(move || token.complete());

        Ok(Binding::Reactive { source, subscription })
    }

    fn apply_listener(&self, name: &str, value: Option<&PropValue>) {
        self.release(name);
        let callback = match value {
            Some(PropValue::Static(Value::Callback(callback))) => callback.clone(),
            Some(PropValue::Stream(stream)) => {
                let stream = stream.clone();
                Callback::new(move |event| {
                    if let Some(Value::Callback(callback)) = stream.current() {
                        callback.call(event);
                    }
                })
            }
            _ => return,
        };
        let event = self.env.adapter.event_name(name);
        let cleanup = self.env.adapter.listen(self.handle(), &event, callback);
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding::Listener(cleanup));
    }

    /// Drop the binding for `name`. Returns true if it was a ref.
    fn release(&self, name: &str) -> bool {
        let binding = self.bindings.borrow_mut().remove(name);
        match binding {
            Some(Binding::Ref(node_ref)) => {
                node_ref.set(None);
                true
            }
            Some(Binding::Listener(cleanup)) => {
                cleanup();
                false
            }
            Some(Binding::Reactive { mut subscription, .. }) => {
                subscription.unsubscribe();
                false
            }
            None => false,
        }
    }

    fn teardown(&self) {
        let bindings: Vec<(String, Binding)> = self.bindings.borrow_mut().drain().collect();
        let (refs, rest): (Vec<_>, Vec<_>) = bindings
            .into_iter()
            .partition(|(_, binding)| matches!(binding, Binding::Ref(_)));
        let (listeners, reactive): (Vec<_>, Vec<_>) = rest
            .into_iter()
            .partition(|(_, binding)| matches!(binding, Binding::Listener(_)));

        for (_, binding) in refs.into_iter().chain(listeners).chain(reactive) {
            match binding {
                Binding::Ref(node_ref) => node_ref.set(None),
                Binding::Listener(cleanup) => cleanup(),
                Binding::Reactive { mut subscription, .. } => subscription.unsubscribe(),
            }
        }
        self.children.teardown();
    }
}

impl Controller for ElementController {
    fn kind(&self) -> NodeKind {
        NodeKind::Element
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Element(next) if next.tag == self.node.borrow().tag)
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(self.handle.get().is_none(), "element controller mounted twice");

        let this = self.this.clone();
        let subscription = Subscription::from_cleanup(move || {
            if let Some(this) = this.upgrade() {
                this.teardown();
            }
        });

        let node = self.node.borrow().clone();
        let handle = self.env.adapter.create_element(&node.tag);
        self.handle.set(Some(handle));
        self.apply_props(&PropMap::new(), &node.props)?;

        self.children.attach(Rc::new(Position::root(handle)));
        self.children.update(&node.children, false)?;
        Ok(subscription)
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Element(next) = node else {
            panic!("element controller cannot apply a {} node", node.kind());
        };
        self.handle();
        let prev = self.node.replace(next.clone());
        assert_eq!(prev.tag, next.tag, "element controller cannot change its tag");

        self.apply_props(&prev.props, &next.props)?;
        if prev.children != next.children {
            self.children.update(&next.children, false)?;
        }
        Ok(())
    }

    fn place_in(&self, position: Rc<Position>) {
        self.placement.place(&self.env.batch, self.handle(), position);
    }

    fn remove(&self) {
        self.placement.remove(&self.env.batch, self.handle());
    }

    fn first_element(&self) -> Option<Handle> {
        self.handle.get().filter(|_| self.placement.is_placed())
    }

    fn last_element(&self) -> Option<Handle> {
        self.first_element()
    }
}
