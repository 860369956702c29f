//! Node reconciler.
//!
//! One [`Controller`] per mounted render node keeps a piece of the target
//! tree in sync with the latest snapshot of that node. Controllers are
//! created from a node, mounted once, updated with newer snapshots of the
//! same identity, and placed or removed at lazily resolved positions.
//!
//! # Lifecycle
//!
//! ```text
//! create_controller(node) -> mount() -> place_in(pos) -> update(next)* -> remove() -> unsubscribe
//! ```
//!
//! - `mount` creates target handles and subscribes to reactive sources. The
//!   returned [`Subscription`] owns everything the controller registered;
//!   closing it tears down all descendants synchronously.
//! - `remove` detaches from the target tree without tearing down, so a
//!   controller can be placed again (suspense and placeholders swap this way).
//! - Calling `update` or `place_in` before `mount` is a contract violation
//!   and panics.
//!
//! # Ownership
//!
//! Parents own child controllers together with their subscriptions
//! ([`Children`] for keyed lists, [`Slot`] for a single tree). Controllers
//! refer back to themselves only weakly, from cleanup closures and sinks.

pub mod children;
pub mod component;
pub mod diff;
pub mod element;
pub mod fragment;
pub mod observable;
pub(crate) mod placement;
pub mod slot;
pub mod suspense;
pub mod text;

use std::rc::Rc;
use std::time::Duration;

use crate::adapter::{Adapter, BatchAdapter, Position};
use crate::error::Result;
use crate::logger::Logger;
use crate::node::{NodeKind, RenderNode};
use crate::reactive::{ContextMap, Scheduler, Subscription, Suspension};
use crate::types::{Handle, Identity};

pub use children::Children;
pub use component::ComponentController;
pub use diff::{diff_children, longest_increasing_subsequence, ChildrenDiff};
pub use element::ElementController;
pub use fragment::FragmentController;
pub use observable::ObservableController;
pub use slot::Slot;
pub use suspense::SuspenseController;
pub use text::TextController;

// =============================================================================
// Controller
// =============================================================================

/// Keeps one render node in sync with the target tree.
pub trait Controller {
    fn kind(&self) -> NodeKind;

    /// Whether `node` can be applied with [`update`](Controller::update)
    /// instead of a remount.
    fn accepts(&self, node: &RenderNode) -> bool;

    fn mount(&self) -> Result<Subscription>;

    /// Apply a newer snapshot of the same node.
    fn update(&self, node: RenderNode) -> Result<()>;

    /// Place (or move) at `position`. Placing twice at the same position
    /// object is a no-op.
    fn place_in(&self, position: Rc<Position>);

    /// Detach from the target tree. The controller stays mounted.
    fn remove(&self);

    /// First placed target handle, used by the next sibling's position.
    fn first_element(&self) -> Option<Handle>;

    /// Last placed target handle, used by the previous sibling's position.
    fn last_element(&self) -> Option<Handle>;
}

// =============================================================================
// Environment
// =============================================================================

/// Shared services handed down the controller tree.
///
/// Suspense boundaries replace the suspension, components replace the
/// context map; everything else is the same for the whole mount.
#[derive(Clone)]
pub struct Env {
    pub(crate) adapter: Rc<dyn Adapter>,
    pub(crate) batch: Rc<BatchAdapter>,
    pub(crate) scheduler: Rc<Scheduler>,
    pub(crate) logger: Rc<dyn Logger>,
    pub(crate) suspension: Suspension,
    pub(crate) context: ContextMap,
    pub(crate) suspense_debounce: Duration,
    pub(crate) pending_debounce: Duration,
}

impl Env {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        batch: Rc<BatchAdapter>,
        scheduler: Rc<Scheduler>,
        logger: Rc<dyn Logger>,
        suspension: Suspension,
        context: ContextMap,
        suspense_debounce: Duration,
        pending_debounce: Duration,
    ) -> Self {
        Self {
            adapter: batch.adapter().clone(),
            batch,
            scheduler,
            logger,
            suspension,
            context,
            suspense_debounce,
            pending_debounce,
        }
    }

    pub fn with_suspension(&self, suspension: Suspension) -> Self {
        Self {
            suspension,
            ..self.clone()
        }
    }

    pub fn with_context(&self, context: ContextMap) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    pub fn suspension(&self) -> &Suspension {
        &self.suspension
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Controller for `node`. Nothing touches the target tree until `mount`.
pub fn create_controller(env: &Env, node: RenderNode) -> Rc<dyn Controller> {
    match node {
        RenderNode::Text(node) => TextController::new(env.clone(), node),
        RenderNode::Element(node) => ElementController::new(env.clone(), node),
        RenderNode::Fragment(node) => FragmentController::new(env.clone(), node),
        RenderNode::Component(node) => ComponentController::new(env.clone(), node),
        RenderNode::Suspense(node) => SuspenseController::new(env.clone(), node),
        RenderNode::Observable(node) => ObservableController::new(env.clone(), node),
    }
}

pub(crate) fn mount_controller(
    env: &Env,
    identity: &Identity,
    node: RenderNode,
) -> Result<(Rc<dyn Controller>, Subscription)> {
    let controller = create_controller(env, node);
    let subscription = controller.mount()?;
    env.logger.node_mounted(controller.kind().as_str(), identity);
    Ok((controller, subscription))
}

/// Detach and tear down a controller that left the tree.
pub(crate) fn discard(
    env: &Env,
    identity: &Identity,
    controller: Rc<dyn Controller>,
    mut subscription: Subscription,
) {
    controller.remove();
    subscription.unsubscribe();
    env.logger.node_removed(controller.kind().as_str(), identity);
}

#[cfg(test)]
pub(crate) fn test_env(adapter: Rc<dyn Adapter>) -> (Env, Rc<Scheduler>) {
    batched_test_env(adapter, Duration::ZERO)
}

#[cfg(test)]
pub(crate) fn batched_test_env(adapter: Rc<dyn Adapter>, batch_time: Duration) -> (Env, Rc<Scheduler>) {
    use crate::logger::NoopLogger;

    let scheduler = Scheduler::new();
    let logger: Rc<dyn Logger> = Rc::new(NoopLogger);
    let batch = BatchAdapter::new(adapter, scheduler.clone(), logger.clone(), batch_time);
    let suspension = Suspension::root(scheduler.clone(), Duration::from_millis(1), logger.clone());
    let env = Env::new(
        batch,
        scheduler.clone(),
        logger,
        suspension,
        ContextMap::new(),
        Duration::from_millis(1),
        Duration::from_millis(1),
    );
    (env, scheduler)
}
