use std::cell::RefCell;
use std::rc::Rc;

use super::placement::Anchored;
use super::{discard, mount_controller, Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{to_render_node, RenderNode, RenderTree};
use crate::reactive::Subscription;
use crate::types::{Handle, Identity};

struct Mounted {
    identity: Identity,
    node: RenderNode,
    controller: Rc<dyn Controller>,
    subscription: Subscription,
}

/// Holder for a single render tree that is replaced over time.
///
/// A new tree with the same identity is forwarded as an update; anything
/// else tears down the current controller and mounts a fresh one at the
/// same position.
pub struct Slot {
    env: Env,
    current: RefCell<Option<Mounted>>,
    anchor: Anchored,
}

impl Slot {
    pub fn new(env: Env) -> Self {
        Self {
            env,
            current: RefCell::new(None),
            anchor: Anchored::default(),
        }
    }

    pub fn set_tree(&self, tree: &RenderTree) -> Result<()> {
        self.set(to_render_node(tree, 0))
    }

    pub fn set(&self, next: Option<RenderNode>) -> Result<()> {
        let current = self
            .current
            .borrow()
            .as_ref()
            .map(|mounted| (mounted.identity.clone(), mounted.controller.clone(), mounted.node.clone()));

        if let (Some((identity, controller, node)), Some(next)) = (&current, &next) {
            if *identity == next.identity() && controller.accepts(next) {
                if node != next {
                    controller.update(next.clone())?;
                    if let Some(mounted) = self.current.borrow_mut().as_mut() {
                        mounted.node = next.clone();
                    }
                }
                return Ok(());
            }
        }

        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            discard(&self.env, &previous.identity, previous.controller, previous.subscription);
        }

        let Some(node) = next else {
            return Ok(());
        };
        let identity = node.identity();
        let (controller, subscription) = mount_controller(&self.env, &identity, node.clone())?;
        *self.current.borrow_mut() = Some(Mounted {
            identity,
            node,
            controller: controller.clone(),
            subscription,
        });
        if let Some(position) = self.anchor.get() {
            controller.place_in(position);
        }
        Ok(())
    }

    pub fn place_in(&self, position: Rc<Position>) {
        if !self.anchor.update(&position) {
            return;
        }
        if let Some(controller) = self.controller() {
            controller.place_in(position);
        }
    }

    pub fn remove(&self) {
        if self.anchor.take().is_none() {
            return;
        }
        if let Some(controller) = self.controller() {
            controller.remove();
        }
    }

    /// Unsubscribe the current controller. Its handles are left in place.
    pub fn teardown(&self) {
        self.anchor.take();
        let current = self.current.borrow_mut().take();
        if let Some(mut mounted) = current {
            mounted.subscription.unsubscribe();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_none()
    }

    pub fn is_placed(&self) -> bool {
        self.anchor.is_placed()
    }

    pub fn first_element(&self) -> Option<Handle> {
        self.controller()?.first_element()
    }

    pub fn last_element(&self) -> Option<Handle> {
        self.controller()?.last_element()
    }

    fn controller(&self) -> Option<Rc<dyn Controller>> {
        self.current.borrow().as_ref().map(|mounted| mounted.controller.clone())
    }
}
