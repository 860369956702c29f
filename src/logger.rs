//! Observability hooks for tree mutation and batching decisions.
//!
//! The reconciler never logs through a global. Every controller holds the
//! [`Logger`] injected at mount time and calls it at fixed lifecycle points:
//!
//! - **publish**: an intent reached the batch layer
//! - **batch**: a commit window opened, closed, or applied an operation
//! - **lifecycle**: a controller mounted or was removed
//!
//! Warnings (duplicate identities, suspension without a boundary) and render
//! errors are reported unconditionally.

use std::error::Error;

use crate::types::{Handle, Identity};

bitflags::bitflags! {
    /// Hook groups a [`TracingLogger`] emits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LogEvents: u8 {
        const PUBLISH = 1 << 0;
        const BATCH = 1 << 1;
        const LIFECYCLE = 1 << 2;
    }
}

impl LogEvents {
    /// Groups enabled by a typical debugging session.
    pub fn debug() -> Self {
        LogEvents::PUBLISH | LogEvents::BATCH
    }
}

/// Injected logging interface. Every hook defaults to a no-op.
pub trait Logger {
    /// An intent (`place`, `move`, `remove`) was handed to the batch layer.
    fn publish_event(&self, _intent: &str, _handle: Handle) {}

    fn begin_batch(&self, _pending: usize) {}

    fn complete_batch(&self, _applied: usize, _cancelled: usize) {}

    fn place_event(&self, _handle: Handle, _parent: Handle) {}

    fn move_event(&self, _handle: Handle, _parent: Handle) {}

    fn remove_event(&self, _handle: Handle, _parent: Handle) {}

    fn node_mounted(&self, _kind: &str, _identity: &Identity) {}

    fn node_removed(&self, _kind: &str, _identity: &Identity) {}

    /// Two siblings share an identity; only the first is rendered.
    fn duplicate_identity(&self, _identity: &Identity) {}

    /// A root suspension turned true with no enclosing boundary.
    fn suspension_without_boundary(&self) {}

    fn component_failed(&self, _component: &str, _props: &str, _error: &dyn Error) {}
}

/// Logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {}

/// [`Logger`] backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger {
    events: LogEvents,
}

impl TracingLogger {
    pub fn new(events: LogEvents) -> Self {
        Self { events }
    }

    pub fn events(&self) -> LogEvents {
        self.events
    }
}

impl Logger for TracingLogger {
    fn publish_event(&self, intent: &str, handle: Handle) {
        if self.events.contains(LogEvents::PUBLISH) {
            tracing::debug!(target: "spark_reconcile::publish", %handle, intent, "publish");
        }
    }

    fn begin_batch(&self, pending: usize) {
        if self.events.contains(LogEvents::BATCH) {
            tracing::debug!(target: "spark_reconcile::batch", pending, "begin batch");
        }
    }

    fn complete_batch(&self, applied: usize, cancelled: usize) {
        if self.events.contains(LogEvents::BATCH) {
            tracing::debug!(target: "spark_reconcile::batch", applied, cancelled, "complete batch");
        }
    }

    fn place_event(&self, handle: Handle, parent: Handle) {
        if self.events.contains(LogEvents::BATCH) {
            tracing::debug!(target: "spark_reconcile::batch", %handle, %parent, "place");
        }
    }

    fn move_event(&self, handle: Handle, parent: Handle) {
        if self.events.contains(LogEvents::BATCH) {
            tracing::debug!(target: "spark_reconcile::batch", %handle, %parent, "move");
        }
    }

    fn remove_event(&self, handle: Handle, parent: Handle) {
        if self.events.contains(LogEvents::BATCH) {
            tracing::debug!(target: "spark_reconcile::batch", %handle, %parent, "remove");
        }
    }

    fn node_mounted(&self, kind: &str, identity: &Identity) {
        if self.events.contains(LogEvents::LIFECYCLE) {
            tracing::debug!(target: "spark_reconcile::lifecycle", kind, %identity, "mounted");
        }
    }

    fn node_removed(&self, kind: &str, identity: &Identity) {
        if self.events.contains(LogEvents::LIFECYCLE) {
            tracing::debug!(target: "spark_reconcile::lifecycle", kind, %identity, "removed");
        }
    }

    fn duplicate_identity(&self, identity: &Identity) {
        tracing::warn!(%identity, "duplicate child identity, later occurrences are skipped");
    }

    fn suspension_without_boundary(&self) {
        tracing::warn!("content suspended outside of any suspense boundary");
    }

    fn component_failed(&self, component: &str, props: &str, error: &dyn Error) {
        tracing::error!(component, props, %error, "component render failed");
    }
}
