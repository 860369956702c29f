use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::placement::Placement;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{NodeKind, RenderNode, TextNode};
use crate::reactive::Subscription;
use crate::types::{Handle, Value};

/// Controller for a text node.
pub struct TextController {
    env: Env,
    text: RefCell<String>,
    handle: Cell<Option<Handle>>,
    placement: Placement,
}

impl TextController {
    pub fn new(env: Env, node: TextNode) -> Rc<Self> {
        Rc::new(Self {
            env,
            text: RefCell::new(display(&node.value)),
            handle: Cell::new(None),
            placement: Placement::default(),
        })
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn handle(&self) -> Handle {
        self.handle.get().expect("text controller used before mount")
    }
}

fn display(value: &Value) -> String {
    value.to_text().unwrap_or_default()
}

impl Controller for TextController {
    fn kind(&self) -> NodeKind {
        NodeKind::Text
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Text(_))
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(self.handle.get().is_none(), "text controller mounted twice");
        let handle = self.env.adapter.create_text(&self.text.borrow());
        self.handle.set(Some(handle));
        Ok(Subscription::new())
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Text(node) = node else {
            panic!("text controller cannot apply a {} node", node.kind());
        };
        let handle = self.handle();
        let next = display(&node.value);
        if *self.text.borrow() != next {
            self.env.adapter.set_text(handle, &next);
            *self.text.borrow_mut() = next;
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
