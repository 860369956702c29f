//! # spark-reconcile
//!
//! Reactive UI reconciliation engine for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A render pass produces an immutable tree of render nodes. Each node is
//! kept alive in the target tree by a controller that mounts it once,
//! receives newer snapshots of the same identity as updates, and issues
//! placement intents at lazily resolved positions. Components run once per
//! mount and observe prop changes through streams.
//!
//! ```text
//! RenderTree → Controllers → BatchAdapter → Adapter (target tree)
//!                  ↑
//!        Streams / Suspension / Scheduler
//! ```
//!
//! The target tree is abstract: anything implementing [`Adapter`] can host a
//! mount. [`adapter::testing::RecordingAdapter`] is an in-memory one that
//! records every call.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Handle, NodeId, Key, Identity, Value, etc.)
//! - [`node`] - Render node model, normalization and authoring factory
//! - [`reactive`] - Streams, scheduler, subscriptions, suspension, contexts
//! - [`component`] - Component definitions and their reactive inputs
//! - [`adapter`] - Target-tree contract and the batched commit layer
//! - [`reconciler`] - Controllers and the keyed children differ
//! - [`pipeline`] - Root mount entry point and event loop helpers

pub mod adapter;
pub mod component;
pub mod config;
pub mod error;
pub mod logger;
pub mod node;
pub mod pipeline;
pub mod reactive;
pub mod reconciler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use adapter::{is_event_prop, Adapter, Anchor, BatchAdapter, Classified, Position, SiblingLookup};

pub use component::{ComponentDef, ComponentRef, Input, RenderFn, Scope};

pub use config::RenderOptions;

pub use error::{BoxError, RenderError, Result};

pub use logger::{LogEvents, Logger, NoopLogger, TracingLogger};

pub use node::{
    collect_children, component, element, fragment, jsx, shallow_diff, shallow_equal, suspense,
    text, to_render_node, ComponentNode, ElementNode, FragmentNode, JsxType, NodeKind,
    ObservableNode, PropMap, PropValue, RenderNode, RenderTree, SuspenseNode, TextNode,
};

pub use pipeline::{mount, run, tick, unmount, MountHandle};

pub use reactive::{
    Context, ContextMap, Debouncer, Scheduler, Stream, Subscription, Suspension, SuspensionToken,
    TimerId,
};

pub use reconciler::{
    create_controller, diff_children, longest_increasing_subsequence, ChildrenDiff, Controller, Env,
};
