use std::cell::Cell;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use super::slot::Slot;
use super::{Controller, Env};
use crate::adapter::Position;
use crate::error::Result;
use crate::node::{NodeKind, ObservableNode, RenderNode, RenderTree};
use crate::reactive::{Stream, Subscription};
use crate::types::Handle;

/// Controller for a bare stream in child position.
///
/// Every emission is resolved to a node and applied to a [`Slot`]: the same
/// identity updates in place, a different one remounts. A newer stream for
/// the same position switches the source without re-subscribing. The
/// source's pending signal is forwarded into the enclosing suspension.
pub struct ObservableController {
    this: Weak<Self>,
    env: Env,
    source: Signal<Stream<RenderTree>>,
    slot: Slot,
    mounted: Cell<bool>,
}

impl ObservableController {
    pub fn new(env: Env, node: ObservableNode) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            source: signal(node.stream),
            slot: Slot::new(env.clone()),
            mounted: Cell::new(false),
            env,
        })
    }
}

impl Controller for ObservableController {
    fn kind(&self) -> NodeKind {
        NodeKind::Observable
    }

    fn accepts(&self, node: &RenderNode) -> bool {
        matches!(node, RenderNode::Observable(_))
    }

    fn mount(&self) -> Result<Subscription> {
        assert!(!self.mounted.replace(true), "observable controller mounted twice");
        let mut subscription = Subscription::new();

        let content = {
            let source = self.source.clone();
            Stream::from_fn_opt(move || source.get().current())
        };
        let this = self.this.clone();
        subscription.add_subscription(content.subscribe(&self.env.scheduler, move |tree| {
            match this.upgrade() {
                Some(this) => this.slot.set_tree(&tree),
                None => Ok(()),
            }
        })?);

        let pending = {
            let source = self.source.clone();
            Stream::from_fn(move || source.get().is_pending())
        };
        let token = Rc::new(self.env.suspension.downstream());
        let raised = token.clone();
        subscription.add_subscription(pending.subscribe(&self.env.scheduler, move |pending| {
            raised.set(pending);
            Ok(())
        })?);
        subscription.add(move || token.complete());

        let this = self.this.clone();
        subscription.add(move || {
            if let Some(this) = this.upgrade() {
                this.slot.teardown();
            }
        });
        Ok(subscription)
    }

    fn update(&self, node: RenderNode) -> Result<()> {
        let RenderNode::Observable(next) = node else {
            panic!("observable controller cannot apply a {} node", node.kind());
        };
        assert!(self.mounted.get(), "observable controller used before mount");
        self.source.set(next.stream);
        Ok(())
    }

    fn place_in(&self, position: Rc<Position>) {
        assert!(self.mounted.get(), "observable controller used before mount");
        self.slot.place_in(position);
    }

    fn remove(&self) {
        self.slot.remove();
    }

    fn first_element(&self) -> Option<Handle> {
        self.slot.first_element()
    }

    fn last_element(&self) -> Option<Handle> {
        self.slot.last_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::{Op, RecordingAdapter};
    use crate::node::{element, to_render_node};
    use crate::reconciler::{create_controller, test_env};

    fn observe(stream: Stream<RenderTree>) -> RenderNode {
        to_render_node(&RenderTree::Stream(stream), 0).unwrap()
    }

    #[test]
    fn test_follows_emissions() {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = test_env(adapter.clone());
        let tree = signal(RenderTree::from("first"));

        let controller = create_controller(&env, observe(Stream::from_signal(tree.clone())));
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));
        assert_eq!(adapter.html(), "first");
        adapter.take_ops();

        tree.set(RenderTree::from("second"));
        scheduler.flush().unwrap();
        assert_eq!(adapter.html(), "second");
        assert!(adapter.take_ops().iter().all(|op| matches!(op, Op::SetText { .. })));

        tree.set(element("b", "b").into());
        scheduler.flush().unwrap();
        assert_eq!(adapter.html(), "<b></b>");
    }

    #[test]
    fn test_update_switches_source() {
        let adapter = RecordingAdapter::new();
        let (env, scheduler) = test_env(adapter.clone());
        let old = signal(RenderTree::from("old"));
        let controller = create_controller(&env, observe(Stream::from_signal(old.clone())));
        let _sub = controller.mount().unwrap();
        controller.place_in(Rc::new(Position::root(adapter.root())));

        controller.update(observe(Stream::constant(RenderTree::from("new")))).unwrap();
        scheduler.flush().unwrap();
        assert_eq!(adapter.html(), "new");

        old.set(RenderTree::from("ignored"));
        scheduler.flush().unwrap();
        assert_eq!(adapter.html(), "new");
    }
}
