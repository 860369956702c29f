//! Keyed children sub-controller.
//!
//! Owns the controllers of one ordered child set (an element's children or a
//! fragment's). On every update the new child list is diffed against the
//! current one by identity:
//!
//! - identities that disappeared, or whose controller rejects the new node,
//!   are removed and torn down
//! - new identities are mounted, then placed
//! - kept identities receive `update` when their snapshot changed, and are
//!   moved only when they fall outside the longest run that kept its order
//!
//! Everything is processed in the new left-to-right order. Each child is
//! placed right after its nearest placed previous sibling; the lookup runs
//! when the adapter applies the operation, so the sibling may be mounted
//! later in the same pass.
//!
//! A child keeps its position object until it moves. Detaching and
//! re-attaching under the same outer position hands every unmoved child the
//! position it was removed from, so the batch layer can cancel the pair.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use super::diff::diff_children;
use super::{discard, mount_controller, Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{collect_children, RenderNode, RenderTree};
use crate::reactive::Subscription;
use crate::types::{Handle, Identity};

struct Entry {
    node: RenderNode,
    controller: Rc<dyn Controller>,
    subscription: Subscription,
}

pub struct Children {
    this: Weak<Self>,
    env: Env,
    outer: RefCell<Option<Rc<Position>>>,
    /// Outer position of the last attach, kept across `detach`.
    last_outer: RefCell<Option<Rc<Position>>>,
    positions: RefCell<HashMap<Identity, Rc<Position>>>,
    order: RefCell<Vec<Identity>>,
    entries: RefCell<HashMap<Identity, Entry>>,
}

impl Children {
    pub fn new(env: Env) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            env,
            outer: RefCell::new(None),
            last_outer: RefCell::new(None),
            positions: RefCell::new(HashMap::new()),
            order: RefCell::new(Vec::new()),
            entries: RefCell::new(HashMap::new()),
        })
    }

    /// Identities in render order.
    pub fn identities(&self) -> Vec<Identity> {
        self.order.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.order.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.borrow().is_empty()
    }

    pub fn is_attached(&self) -> bool {
        self.outer.borrow().is_some()
    }

    /// Reconcile against a new child list.
    pub fn update(&self, trees: &[RenderTree], positional: bool) -> Result<()> {
        let collected = collect_children(trees, positional);
        for identity in &collected.duplicates {
            self.env.logger.duplicate_identity(identity);
        }

        let next_order: Vec<Identity> = collected.nodes.iter().map(|(id, _)| id.clone()).collect();
        let next_nodes: HashMap<&Identity, &RenderNode> =
            collected.nodes.iter().map(|(id, node)| (id, node)).collect();

        // Removals first, so nothing anchors to a departing sibling.
        let previous = self.order.borrow().clone();
        let mut departing = Vec::new();
        {
            let mut entries = self.entries.borrow_mut();
            for identity in &previous {
                let keep = match (entries.get(identity), next_nodes.get(identity)) {
                    (Some(entry), Some(node)) => entry.controller.accepts(node),
                    _ => false,
                };
                if !keep {
                    if let Some(entry) = entries.remove(identity) {
                        departing.push((identity.clone(), entry));
                    }
                }
            }
        }
        for (identity, entry) in departing {
            self.positions.borrow_mut().remove(&identity);
            discard(&self.env, &identity, entry.controller, entry.subscription);
        }

        let kept: Vec<Identity> = {
            let entries = self.entries.borrow();
            previous.into_iter().filter(|id| entries.contains_key(id)).collect()
        };
        let moved: HashSet<Identity> = diff_children(&kept, &next_order).moved.into_iter().collect();

        *self.order.borrow_mut() = next_order;
        let attached = self.is_attached();

        for (identity, node) in collected.nodes {
            let existing = self
                .entries
                .borrow()
                .get(&identity)
                .map(|entry| (entry.controller.clone(), entry.node != node));

            match existing {
                Some((controller, changed)) => {
                    if changed {
                        controller.update(node.clone())?;
                        if let Some(entry) = self.entries.borrow_mut().get_mut(&identity) {
                            entry.node = node;
                        }
                    }
                    if moved.contains(&identity) {
                        if attached {
                            controller.place_in(self.position_for(&identity));
                        } else {
                            self.positions.borrow_mut().remove(&identity);
                        }
                    }
                }
                None => {
                    let (controller, subscription) = mount_controller(&self.env, &identity, node.clone())?;
                    self.entries.borrow_mut().insert(
                        identity.clone(),
                        Entry {
                            node,
                            controller: controller.clone(),
                            subscription,
                        },
                    );
                    if attached {
                        controller.place_in(self.position_for(&identity));
                    }
                }
            }
        }
        Ok(())
    }

    /// Place every child under `outer`. Children already placed are moved.
    ///
    /// Re-attaching under the outer position of the previous attach reuses
    /// the positions of children that did not move in between.
    pub fn attach(&self, outer: Rc<Position>) {
        let same_outer = self
            .last_outer
            .borrow()
            .as_ref()
            .is_some_and(|last| Rc::ptr_eq(last, &outer));
        if !same_outer {
            self.positions.borrow_mut().clear();
        }
        *self.last_outer.borrow_mut() = Some(outer.clone());
        *self.outer.borrow_mut() = Some(outer);

        for identity in self.identities() {
            if let Some(controller) = self.controller(&identity) {
                let cached = self.positions.borrow().get(&identity).cloned();
                let position = cached.unwrap_or_else(|| self.position_for(&identity));
                controller.place_in(position);
            }
        }
    }

    /// Remove every child from the target tree, keeping them mounted.
    pub fn detach(&self) {
        if self.outer.borrow_mut().take().is_none() {
            return;
        }
        for identity in self.identities() {
            if let Some(controller) = self.controller(&identity) {
                controller.remove();
            }
        }
    }

    /// Unsubscribe every child in order. Target handles are left in place.
    pub fn teardown(&self) {
        self.outer.borrow_mut().take();
        self.last_outer.borrow_mut().take();
        self.positions.borrow_mut().clear();
        let order = std::mem::take(&mut *self.order.borrow_mut());
        let mut entries = std::mem::take(&mut *self.entries.borrow_mut());
        for identity in order {
            if let Some(mut entry) = entries.remove(&identity) {
                entry.subscription.unsubscribe();
            }
        }
    }

    pub fn first_element(&self) -> Option<Handle> {
        self.identities()
            .iter()
            .find_map(|identity| self.controller(identity)?.first_element())
    }

    pub fn last_element(&self) -> Option<Handle> {
        self.identities()
            .iter()
            .rev()
            .find_map(|identity| self.controller(identity)?.last_element())
    }

    fn controller(&self, identity: &Identity) -> Option<Rc<dyn Controller>> {
        self.entries.borrow().get(identity).map(|entry| entry.controller.clone())
    }

    /// Fresh position for `identity` under the current outer position. It
    /// replaces the one remembered for `identity`.
    fn position_for(&self, identity: &Identity) -> Rc<Position> {
        let parent = self
            .outer
            .borrow()
            .as_ref()
            .map(|outer| outer.parent())
            .expect("children positioned while detached");

        let previous = {
            let this = self.this.clone();
            let identity = identity.clone();
            Rc::new(move || this.upgrade().and_then(|children| children.previous_of(&identity)))
        };
        let next = {
            let this = self.this.clone();
            let identity = identity.clone();
            Rc::new(move || this.upgrade().and_then(|children| children.next_of(&identity)))
        };
        let position = Rc::new(Position::new(parent, Some(previous), Some(next)));
        self.positions.borrow_mut().insert(identity.clone(), position.clone());
        position
    }

    fn previous_of(&self, identity: &Identity) -> Option<Handle> {
        let siblings = self.identities();
        let index = siblings.iter().position(|id| id == identity)?;
        siblings[..index]
            .iter()
            .rev()
            .find_map(|id| self.controller(id)?.last_element())
            .or_else(|| self.outer_position()?.previous())
    }

    fn next_of(&self, identity: &Identity) -> Option<Handle> {
        let siblings = self.identities();
        let index = siblings.iter().position(|id| id == identity)?;
        siblings[index + 1..]
            .iter()
            .find_map(|id| self.controller(id)?.first_element())
            .or_else(|| self.outer_position()?.next())
    }

    fn outer_position(&self) -> Option<Rc<Position>> {
        self.outer.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::{Op, RecordingAdapter};
    use crate::node::element;
    use crate::reactive::Scheduler;
    use crate::reconciler::{batched_test_env, test_env};
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_millis(10);

    fn items(keys: &[&str]) -> Vec<RenderTree> {
        keys.iter()
            .map(|key| element("li", "li").key(*key).child(*key).into())
            .collect()
    }

    fn setup() -> (Rc<RecordingAdapter>, Rc<Children>) {
        let adapter = RecordingAdapter::new();
        let (env, _scheduler) = test_env(adapter.clone());
        let children = Children::new(env);
        children.attach(Rc::new(Position::root(adapter.root())));
        (adapter, children)
    }

    #[test]
    fn test_mounts_in_order() {
        let (adapter, children) = setup();
        children.update(&items(&["a", "b", "c"]), false).unwrap();
        assert_eq!(adapter.html(), "<li>a</li><li>b</li><li>c</li>");
    }

    #[test]
    fn test_swap_issues_one_move() {
        let (adapter, children) = setup();
        children.update(&items(&["a", "b"]), false).unwrap();
        adapter.take_ops();

        children.update(&items(&["b", "a"]), false).unwrap();
        let ops = adapter.take_ops();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Op::Move { .. }));
        assert_eq!(adapter.html(), "<li>b</li><li>a</li>");
    }

    #[test]
    fn test_insert_between_keeps_neighbours() {
        let (adapter, children) = setup();
        children.update(&items(&["a", "c"]), false).unwrap();
        adapter.take_ops();

        children.update(&items(&["a", "b", "c"]), false).unwrap();
        let root = adapter.root();
        let in_root: Vec<Op> = adapter
            .structural_ops()
            .into_iter()
            .filter(|op| match op {
                Op::Place { parent, .. } | Op::Move { parent, .. } | Op::Remove { parent, .. } => *parent == root,
                _ => false,
            })
            .collect();
        assert_eq!(in_root.len(), 1);
        assert!(matches!(in_root[0], Op::Place { .. }));
        assert_eq!(adapter.html(), "<li>a</li><li>b</li><li>c</li>");
    }

    #[test]
    fn test_reorder_with_additions() {
        let (adapter, children) = setup();
        children.update(&items(&["x", "y"]), false).unwrap();
        children.update(&items(&["y", "x", "c"]), false).unwrap();
        assert_eq!(adapter.html(), "<li>y</li><li>x</li><li>c</li>");
    }

    #[test]
    fn test_removal_touches_only_removed() {
        let (adapter, children) = setup();
        children.update(&items(&["a", "b"]), false).unwrap();
        adapter.take_ops();

        children.update(&items(&["a"]), false).unwrap();
        let ops = adapter.structural_ops();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Op::Remove { .. }));
        assert_eq!(adapter.html(), "<li>a</li>");
    }

    #[test]
    fn test_detach_and_attach() {
        let (adapter, children) = setup();
        children.update(&items(&["a", "b"]), false).unwrap();

        children.detach();
        assert_eq!(adapter.html(), "");
        assert!(children.first_element().is_none());

        children.attach(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "<li>a</li><li>b</li>");
    }

    fn batched() -> (Rc<RecordingAdapter>, Rc<Scheduler>, Rc<Children>, Rc<Position>) {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = batched_test_env(adapter.clone(), WINDOW);
        let children = Children::new(env);
        let outer = Rc::new(Position::root(adapter.root()));
        children.attach(outer.clone());
        (adapter, scheduler, children, outer)
    }

    #[test]
    fn test_reattach_inside_window_commits_nothing() {
        let (adapter, scheduler, children, outer) = batched();
        children.update(&items(&["a", "b"]), false).unwrap();
        scheduler.advance(WINDOW).unwrap();
        adapter.take_ops();

        children.detach();
        children.attach(outer);
        scheduler.advance(WINDOW).unwrap();

        assert!(adapter.structural_ops().is_empty());
        assert_eq!(adapter.html(), "<li>a</li><li>b</li>");
    }

    #[test]
    fn test_reorder_while_detached_moves_on_reattach() {
        let (adapter, scheduler, children, outer) = batched();
        children.update(&items(&["a", "b", "c"]), false).unwrap();
        scheduler.advance(WINDOW).unwrap();
        adapter.take_ops();

        children.detach();
        children.update(&items(&["c", "a", "b"]), false).unwrap();
        children.attach(outer);
        scheduler.advance(WINDOW).unwrap();

        let structural = adapter.structural_ops();
        assert_eq!(structural.len(), 1, "{structural:?}");
        assert!(matches!(structural[0], Op::Move { .. }));
        assert_eq!(adapter.html(), "<li>c</li><li>a</li><li>b</li>");
    }

    #[test]
    fn test_attach_under_new_outer_moves_everything() {
        let (adapter, scheduler, children, _outer) = batched();
        children.update(&items(&["a", "b"]), false).unwrap();
        scheduler.advance(WINDOW).unwrap();
        adapter.take_ops();

        children.detach();
        children.attach(Rc::new(Position::root(adapter.root())));
        scheduler.advance(WINDOW).unwrap();

        assert_eq!(adapter.structural_ops().len(), 2);
        assert!(adapter.structural_ops().iter().all(|op| matches!(op, Op::Move { .. })));
        assert_eq!(adapter.html(), "<li>a</li><li>b</li>");
    }

    #[test]
    fn test_unattached_children_are_placed_on_attach() {
        let adapter = RecordingAdapter::new();
        let (env, _scheduler) = test_env(adapter.clone());
        let children = Children::new(env);

        children.update(&items(&["a"]), false).unwrap();
        assert!(adapter.structural_ops().is_empty());

        children.attach(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "<li>a</li>");
    }
}
