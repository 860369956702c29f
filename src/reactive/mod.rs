//! Reactive substrate for the reconciler.
//!
//! Signals come from `spark-signals`. This module adds what the reconciler
//! needs on top of them:
//!
//! - [`Stream`]: a value reader paired with an optional pending signal
//! - [`Scheduler`] / [`Debouncer`]: deferred delivery and timers on a virtual clock
//! - [`Subscription`]: ordered teardown
//! - [`Suspension`]: hierarchical loading state
//! - [`ContextMap`]: values handed down the component tree

pub mod context;
pub mod scheduler;
pub mod stream;
pub mod subscription;
pub mod suspension;

pub use context::{Context, ContextMap};
pub use scheduler::{Debouncer, Scheduler, TimerId};
pub use stream::Stream;
pub use subscription::Subscription;
pub use suspension::{Suspension, SuspensionToken};
