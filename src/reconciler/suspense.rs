//! Suspense boundary controller.
//!
//! Children and fallback are both mounted for the whole life of the
//! boundary. The children see a private [`Suspension`]; whenever its
//! debounced state flips, the visible side is swapped by removing one slot
//! and placing the other. Neither side is torn down by a swap.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::placement::Anchored;
use super::slot::Slot;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{NodeKind, RenderNode, SuspenseNode};
use crate::reactive::{Subscription, Suspension};
use crate::types::Handle;

pub struct SuspenseController {
    this: Weak<Self>,
    env: Env,
    node: RefCell<SuspenseNode>,
    boundary: Suspension,
    children: Slot,
    fallback: Slot,
    showing_fallback: Cell<bool>,
    anchor: Anchored,
    mounted: Cell<bool>,
}

impl SuspenseController {
    pub fn new(env: Env, node: SuspenseNode) -> Rc<Self> {
        let boundary = Suspension::boundary(env.scheduler.clone(), env.suspense_debounce);
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            children: Slot::new(env.with_suspension(boundary.clone())),
            fallback: Slot::new(env.clone()),
            boundary,
            node: RefCell::new(node),
            showing_fallback: Cell::new(false),
            anchor: Anchored::default(),
            mounted: Cell::new(false),
            env,
        })
    }

    pub fn is_showing_fallback(&self) -> bool {
        self.showing_fallback.get()
    }

    pub fn boundary(&self) -> &Suspension {
        &self.boundary
    }

    fn show_fallback(&self, show: bool) {
        if self.showing_fallback.replace(show) == show {
            return;
        }
        let Some(position) = self.anchor.get() else {
            return;
        };
        if show {
            self.children.remove();
            self.fallback.place_in(position);
        } else {
            self.fallback.remove();
            self.children.place_in(position);
        }
    }

    fn visible(&self) -> &Slot {
        if self.showing_fallback.get() {
            &self.fallback
        } else {
            &self.children
        }
    }
}

impl Controller for SuspenseController {
    fn kind(&self) -> NodeKind {
        NodeKind::Suspense
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Suspense(_))
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(!self.mounted.replace(true), "suspense controller mounted twice");
        let node = self.node.borrow().clone();

        self.children.set_tree(&node.children)?;
        self.fallback.set_tree(&node.fallback)?;

        let mut subscription = Subscription::new();
        let this = self.this.clone();
        let suspended = self.boundary.suspended_stream();
        subscription.add_subscription(suspended.subscribe(&self.env.scheduler, move |suspended| {
            if let Some(this) = this.upgrade() {
                this.show_fallback(suspended);
            }
            Ok(())
        })?);

        let this = self.this.clone();
        subscription.add(move || {
            if let Some(this) = this.upgrade() {
                this.anchor.take();
                this.children.teardown();
                this.fallback.teardown();
            }
        });
        Ok(subscription)
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Suspense(next) = node else {
            panic!("suspense controller cannot apply a {} node", node.kind());
        };
        assert!(self.mounted.get(), "suspense controller used before mount");
        let prev = self.node.replace(next.clone());
        if prev.children != next.children {
            self.children.set_tree(&next.children)?;
        }
        if prev.fallback != next.fallback {
            self.fallback.set_tree(&next.fallback)?;
        }
        Ok(())
    }

    fn place_in(&self, position: Rc<Position>) {
        assert!(self.mounted.get(), "suspense controller used before mount");
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
    use crate::node::{element, suspense, RenderTree};
    use crate::reactive::Stream;
    use crate::reconciler::{create_controller, test_env};
    use crate::types::Value;
    use spark_signals::signal;
    use std::time::Duration;

    #[test]
    fn test_fallback_while_children_pending() {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = test_env(adapter.clone());
        let title = signal(None::<Value>);
        let content = element("p", "p").prop("title", Stream::from_deferred(title.clone()));
        let node = suspense("s", "wait", content).build();

        let controller = create_controller(&env, node);
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "<p></p>");

        scheduler.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(adapter.html(), "wait");
        assert!(!env.suspension.has_raised_tokens());

        title.set(Some(Value::from("done")));
        scheduler.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(adapter.html(), "<p title=\"done\"></p>");
    }

    #[test]
    fn test_update_reaches_both_sides() {
        let adapter = RecordingAdapter::new();
        let (env, _) = test_env(adapter.clone());
        let controller = create_controller(&env, suspense("s", "wait", RenderTree::from("a")).build());
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));

        controller
            .update(suspense("s", "still waiting", RenderTree::from("b")).build())
            .unwrap();
        assert_eq!(adapter.html(), "b");
    }
}
