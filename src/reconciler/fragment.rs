use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::children::Children;
use super::placement::Anchored;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{FragmentNode, NodeKind, RenderNode};
use crate::reactive::Subscription;
use crate::types::Handle;

/// Controller for a fragment. Has no handle of its own; its children are
/// placed directly at the fragment's position.
pub struct FragmentController {
    node: RefCell<FragmentNode>,
    children: Rc<Children>,
    anchor: Anchored,
    mounted: Cell<bool>,
}

impl FragmentController {
    pub fn new(env: Env, node: FragmentNode) -> Rc<Self> {
        Rc::new(Self {
            node: RefCell::new(node),
            children: Children::new(env),
            anchor: Anchored::default(),
            mounted: Cell::new(false),
        })
    }

    pub fn children(&self) -> &Rc<Children> {
        &self.children
    }

    fn assert_mounted(&self) {
        assert!(self.mounted.get(), "fragment controller used before mount");
    }
}

impl Controller for FragmentController {
    fn kind(&self) -> NodeKind {
        NodeKind::Fragment
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Fragment(next) if next.positional == self.node.borrow().positional)
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(!self.mounted.replace(true), "fragment controller mounted twice");
        let node = self.node.borrow().clone();
        self.children.update(&node.children, node.positional)?;

        let children = self.children.clone();
        Ok(Subscription::from_cleanup(move || children.teardown()))
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Fragment(next) = node else {
            panic!("fragment controller cannot apply a {} node", node.kind());
        };
        self.assert_mounted();
        let prev = self.node.replace(next.clone());
        if prev.children != next.children {
            self.children.update(&next.children, next.positional)?;
        }
        Ok(())
    }

    fn place_in(&self, position: Rc<Position>) {
        self.assert_mounted();
        if self.anchor.update(&position) {
            self.children.attach(position);
        }
    }

    fn remove(&self) {
        if self.anchor.take().is_some() {
            self.children.detach();
        }
    }

    fn first_element(&self) -> Option<Handle> {
        self.children.first_element()
    }

    fn last_element(&self) -> Option<Handle> {
        self.children.last_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::RecordingAdapter;
    use crate::node::{element, fragment, RenderTree};
    use crate::reconciler::{create_controller, test_env};

    #[test]
    fn test_children_land_in_parent() {
        let adapter = RecordingAdapter::new();
        let (env, _) = test_env(adapter.clone());
        let node = fragment("f").child(element("a", "b")).child("text").build();
        let controller = create_controller(&env, node);
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));

        assert_eq!(adapter.html(), "<b></b>text");
        assert_eq!(controller.first_element(), adapter.children(adapter.root()).first().copied());

        controller.remove();
        assert_eq!(adapter.html(), "");
        assert_eq!(controller.first_element(), None);
    }

    #[test]
    fn test_positional_list_matches_by_index() {
        let adapter = RecordingAdapter::new();
        let (env, _) = test_env(adapter.clone());
        let list = |labels: &[&str]| -> RenderNode {
            let items: Vec<RenderTree> = labels.iter().map(|l| element("li", "li").child(*l).into()).collect();
            crate::node::to_render_node(&RenderTree::List(items), 0).unwrap()
        };

        let controller = create_controller(&env, list(&["a", "b"]));
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));
        adapter.take_ops();

        controller.update(list(&["a", "c"])).unwrap();
        assert_eq!(adapter.html(), "<li>a</li><li>c</li>");
        assert!(adapter.structural_ops().is_empty());
    }
}
