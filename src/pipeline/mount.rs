//! Mount API - root entry point and event loop helpers.
//!
//! [`mount`] wires a render tree to a target handle: it builds the
//! scheduler, the batch layer and the root suspension, mounts the tree and
//! places it under the target. Everything that happens later (stream
//! deliveries, debounced swaps, batch commits) runs when the host drives the
//! scheduler through the returned [`MountHandle`].
//!
//! # Example
//!
//! ```ignore
//! use spark_reconcile::pipeline::mount;
//!
//! let handle = mount::mount(app, target, adapter, RenderOptions::default())?;
//!
//! // Option 1: Run until nothing is left to do
//! mount::run(&handle)?;
//!
//! // Option 2: Tick manually in your own loop
//! while mount::tick(&handle)? {
//!     // Your logic here
//! }
//!
//! // Tear everything down
//! handle.unmount();
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::adapter::{Adapter, BatchAdapter, Position};
use crate::config::RenderOptions;
use crate::error::Result;
use crate::node::RenderTree;
use crate::reactive::{ContextMap, Scheduler, Suspension};
use crate::reconciler::{Env, Slot};
use crate::types::Handle;

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`]. Dropping it tears the tree down.
///
/// Holds:
/// - The root slot owning every controller
/// - The scheduler driving deferred work
/// - The batch layer, flushed on unmount
pub struct MountHandle {
    root: Option<Slot>,
    target: Handle,
    scheduler: Rc<Scheduler>,
    batch: Rc<BatchAdapter>,
    suspension: Suspension,
    last_tick: Cell<Instant>,
}

impl MountHandle {
    /// Remove the tree from the target and tear down every controller.
    ///
    /// This will:
    /// 1. Remove the root content from the target
    /// 2. Unsubscribe every controller, listener and stream
    /// 3. Commit the pending batch so the removal is applied now
    pub fn unmount(mut self) {
        self.dispose();
    }

    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }

    pub fn target(&self) -> Handle {
        self.target
    }

    /// Render a new root tree in place of the current one.
    pub fn update(&self, tree: impl Into<RenderTree>) -> Result<()> {
        self.root().set_tree(&tree.into())
    }

    /// Run every queued task and due timer.
    pub fn flush(&self) -> Result<()> {
        self.scheduler.flush()
    }

    /// Advance virtual time by `by`.
    pub fn advance(&self, by: Duration) -> Result<()> {
        self.scheduler.advance(by)
    }

    /// Advance virtual time until no task or timer is left.
    pub fn settle(&self) -> Result<()> {
        self.scheduler.flush()?;
        while let Some(deadline) = self.scheduler.next_deadline() {
            let wait = deadline.saturating_sub(self.scheduler.now());
            self.scheduler.advance(wait)?;
        }
        Ok(())
    }

    /// Commit buffered placement intents without waiting for the window.
    pub fn commit(&self) {
        self.batch.flush_now();
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Published state of the root suspension.
    pub fn is_suspended(&self) -> bool {
        self.suspension.is_suspended()
    }

    fn root(&self) -> &Slot {
        self.root.as_ref().expect("mount handle used after unmount")
    }

    fn dispose(&mut self) {
        if let Some(root) = self.root.take() {
            root.remove();
            root.teardown();
            self.batch.flush_now();
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountHandle")
            .field("target", &self.target)
            .field("mounted", &self.is_mounted())
            .field("now", &self.scheduler.now())
            .finish()
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Mount `tree` under `target`.
///
/// This sets up:
/// 1. The scheduler and the batch layer over `adapter`
/// 2. The root suspension (turning suspended there is reported as a warning)
/// 3. The root controller, mounted and placed at the start of `target`
///
/// Errors raised by component render functions during the first render are
/// returned here; later ones surface from [`MountHandle::flush`],
/// [`MountHandle::advance`] and [`tick`].
pub fn mount(
    tree: impl Into<RenderTree>,
    target: Handle,
    adapter: Rc<dyn Adapter>,
    options: RenderOptions,
) -> Result<MountHandle> {
    let logger = options.resolve_logger();
    let scheduler = Scheduler::new();
    let batch = BatchAdapter::new(adapter, scheduler.clone(), logger.clone(), options.batch_time);
    let suspension = Suspension::root(scheduler.clone(), options.suspense_debounce, logger.clone());

    let env = Env::new(
        batch.clone(),
        scheduler.clone(),
        logger,
        suspension.clone(),
        ContextMap::new(),
        options.suspense_debounce,
        options.pending_debounce,
    );

    let root = Slot::new(env);
    root.set_tree(&tree.into())?;
    root.place_in(Rc::new(Position::root(target)));

    Ok(MountHandle {
        root: Some(root),
        target,
        scheduler,
        batch,
        suspension,
        last_tick: Cell::new(Instant::now()),
    })
}

/// Unmount and clean up.
pub fn unmount(handle: MountHandle) {
    handle.unmount();
}

// =============================================================================
// Event Loop
// =============================================================================

/// Advance the scheduler by the wall-clock time since the previous tick.
///
/// # Returns
///
/// * `Ok(true)` - Work is still queued or scheduled
/// * `Ok(false)` - Nothing left to do
/// * `Err(e)` - A deferred render step failed
pub fn tick(handle: &MountHandle) -> Result<bool> {
    let now = Instant::now();
    let elapsed = now.duration_since(handle.last_tick.replace(now));
    handle.advance(elapsed)?;
    Ok(handle.is_mounted() && !handle.scheduler.is_idle())
}

/// Tick until nothing is left to do, sleeping until the next timer.
pub fn run(handle: &MountHandle) -> Result<()> {
    while tick(handle)? {
        if let Some(deadline) = handle.scheduler.next_deadline() {
            let wait = deadline.saturating_sub(handle.scheduler.now());
            std::thread::sleep(wait);
        }
    }
    Ok(())
}
