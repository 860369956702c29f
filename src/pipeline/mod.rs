//! Root Pipeline
//!
//! Connects a render tree to a target tree and drives it over time.
//!
//! # Pipeline Architecture
//!
//! ```text
//! RenderTree → root Slot → controllers → BatchAdapter → Adapter
//!                               ↑
//!                  Scheduler (deliveries, debounces, commit window)
//! ```
//!
//! ## Data Flow
//!
//! 1. **mount** - Normalizes the tree, mounts controllers, places the root
//! 2. **reactive sources** - Signal writes queue stream deliveries on the scheduler
//! 3. **controllers** - Apply deliveries: text, props, children, swaps
//! 4. **batch layer** - Coalesces placement intents, commits after the window

pub mod mount;

pub use mount::{mount, run, tick, unmount, MountHandle};
