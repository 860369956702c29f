//! Component controller.
//!
//! Invokes the component's render function exactly once per mount and
//! keeps whatever the returned stream yields mounted in a [`Slot`]. Prop
//! updates flow into the component through its [`Input`]; the function is
//! never called again for the same instance.
//!
//! While the instance is pending (no output yet, or a prop is loading) it
//! either shows the component's placeholder, after `pending_debounce`, or
//! raises a token in the enclosing suspension when there is no placeholder.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::placement::Anchored;
use super::slot::Slot;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::component::{ComponentRef, Input, Scope};
use crate::error::{RenderError, Result};
use crate::node::{ComponentNode, NodeKind, PropMap, RenderNode};
use crate::reactive::{Debouncer, Subscription};
use crate::types::Handle;

pub struct ComponentController {
    this: Weak<Self>,
    env: Env,
    node: RefCell<ComponentNode>,
    input: Input,
    scope: Scope,
    content: Slot,
    placeholder: Slot,
    showing_placeholder: Cell<bool>,
    anchor: Anchored,
    pending_window: Debouncer,
    mounted: Cell<bool>,
}

impl ComponentController {
    pub fn new(env: Env, node: ComponentNode) -> Rc<Self> {
        let input = Input::new(node.props.clone(), node.component.defaults().clone());
        let context = env.context.downstream();
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            input,
            scope: Scope::new(context.clone()),
            content: Slot::new(env.with_context(context)),
            placeholder: Slot::new(env.clone()),
            showing_placeholder: Cell::new(false),
            anchor: Anchored::default(),
            pending_window: Debouncer::new(env.scheduler.clone(), env.pending_debounce),
            mounted: Cell::new(false),
            node: RefCell::new(node),
            env,
        })
    }

    pub fn component(&self) -> ComponentRef {
        self.node.borrow().component.clone()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn is_showing_placeholder(&self) -> bool {
        self.showing_placeholder.get()
    }

    fn render_failed(&self, source: crate::error::BoxError) -> RenderError {
        let component = self.component().name().to_string();
        let props = describe_props(&self.input.props());
        self.env.logger.component_failed(&component, &props, source.as_ref());
        RenderError::Component {
            component,
            props,
            source,
        }
    }

    fn pending_changed(&self) {
        let this = self.this.clone();
        self.pending_window.call(move || {
            if let Some(this) = this.upgrade() {
                let pending = this.input.is_pending();
                this.show_placeholder(pending)?;
            }
            Ok(())
        });
    }

    fn show_placeholder(&self, show: bool) -> Result<()> {
        if self.showing_placeholder.get() == show {
            return Ok(());
        }
        if show && self.placeholder.is_empty() {
            let tree = self.component().placeholder();
            self.placeholder.set_tree(&tree)?;
        }
        self.showing_placeholder.set(show);

        let Some(position) = self.anchor.get() else {
            return Ok(());
        };
        if show {
            self.content.remove();
            self.placeholder.place_in(position);
        } else {
            self.placeholder.remove();
            self.content.place_in(position);
        }
        Ok(())
    }

    fn visible(&self) -> &Slot {
        if self.showing_placeholder.get() {
            &self.placeholder
        } else {
            &self.content
        }
    }

    fn assert_mounted(&self) {
        assert!(self.mounted.get(), "component controller used before mount");
    }
}

/// `{name: value, ..}` with loading props shown as `<pending>`.
fn describe_props(props: &PropMap) -> String {
    let fields: Vec<String> = props
        .iter()
        .map(|(name, prop)| match prop.current() {
            Some(value) => format!("{name}: {value:?}"),
            None => format!("{name}: <pending>"),
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

impl Controller for ComponentController {
    fn kind(&self) -> NodeKind {
        NodeKind::Component
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Component(next) if Rc::ptr_eq(&next.component, &self.node.borrow().component))
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(!self.mounted.replace(true), "component controller mounted twice");

        let component = self.component();
        let output = component
            .invoke(&self.input, &self.scope)
            .map_err(|source| self.render_failed(source))?;

        let mut subscription = Subscription::new();

        let this = self.this.clone();
        subscription.add_subscription(output.subscribe(&self.env.scheduler, move |tree| {
            let Some(this) = this.upgrade() else {
                return Ok(());
            };
            this.content.set_tree(&tree)?;
            this.input.mark_rendered();
            Ok(())
        })?);

        let pending = self.input.pending();
        if component.has_placeholder() {
            let this = self.this.clone();
            subscription.add_subscription(pending.subscribe(&self.env.scheduler, move |_| {
                if let Some(this) = this.upgrade() {
                    this.pending_changed();
                }
                Ok(())
            })?);
        } else {
            let token = Rc::new(self.env.suspension.downstream());
            let raised = token.clone();
            subscription.add_subscription(pending.subscribe(&self.env.scheduler, move |pending| {
                raised.set(pending);
                Ok(())
            })?);
            subscription.add(move || token.complete());
        }

        let this = self.this.clone();
        subscription.add(move || {
            if let Some(this) = this.upgrade() {
                this.pending_window.cancel();
                this.anchor.take();
                this.content.teardown();
                this.placeholder.teardown();
            }
        });
        Ok(subscription)
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Component(next) = node else {
            panic!("component controller cannot apply a {} node", node.kind());
        };
        self.assert_mounted();
        assert!(
            Rc::ptr_eq(&next.component, &self.node.borrow().component),
            "component controller cannot switch components"
        );
        self.input.set_props(next.props.clone());
        *self.node.borrow_mut() = next;
        Ok(())
    }

    fn place_in(&self, position: Rc<Position>) {
        self.assert_mounted();
        if self.anchor.update(&position) {
            self.visible().place_in(position);
        }
    }

    fn remove(&self) {
        if self.anchor.take().is_some() {
            self.visible().remove();
        }
    }

    fn first_element(&self) -> Option<Handle> {
        self.visible().first_element()
    }

    fn last_element(&self) -> Option<Handle> {
        self.visible().last_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::RecordingAdapter;
    use crate::component::ComponentDef;
    use crate::node::{component, element, RenderTree};
    use crate::reconciler::{create_controller, test_env};
    use crate::types::Value;
    use spark_signals::signal;
    use std::time::Duration;

    fn label() -> ComponentRef {
        ComponentDef::from_render("Label", |props| {
            let text = props.get("text").cloned().unwrap_or_default();
            element("span", "span").child(RenderTree::Text(text)).into()
        })
        .build()
    }

    #[test]
    fn test_render_runs_once_and_props_flow_through_input() {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = test_env(adapter.clone());
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let def = ComponentDef::new("Counter", move |input, _scope| {
            counter.set(counter.get() + 1);
            Ok(input.get("count").map(|count| RenderTree::Text(count)))
        })
        .build();

        let controller = create_controller(&env, component("c", &def).prop("count", 1).build());
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "1");

        controller.update(component("c", &def).prop("count", 2).build()).unwrap();
        scheduler.flush().unwrap();
        assert_eq!(adapter.html(), "2");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_accepts_only_same_component() {
        let adapter = RecordingAdapter::new();
        let (env, _) = test_env(adapter);
        let def = label();
        let controller = create_controller(&env, component("c", &def).build());
        assert!(controller.accepts(&component("c", &def).build()));
        assert!(!controller.accepts(&component("c", &label()).build()));
    }

    #[test]
    fn test_render_error_is_reported() {
        let adapter = RecordingAdapter::new();
        let (env, _) = test_env(adapter);
        let def = ComponentDef::new("Broken", |_, _| Err("no data".into())).build();
        let controller = create_controller(&env, component("c", &def).prop("id", 7).build());

        let Err(RenderError::Component { component, props, .. }) = controller.mount() else {
            panic!("expected a component error");
        };
        assert_eq!(component, "Broken");
        assert_eq!(props, "{id: Int(7)}");
    }

    #[test]
    fn test_placeholder_shown_while_pending() {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = test_env(adapter.clone());
        let def = ComponentDef::from_render("Slow", |props| {
            RenderTree::Text(props.get("count").cloned().unwrap_or_default())
        })
        .with_placeholder(|| "loading".into())
        .build();
        let count = signal(None::<Value>);
        let node = component("c", &def)
            .prop("count", crate::reactive::Stream::from_deferred(count.clone()))
            .build();

        let controller = create_controller(&env, node);
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "");

        scheduler.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(adapter.html(), "loading");

        count.set(Some(Value::Int(3)));
        scheduler.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(adapter.html(), "3");
    }
}
