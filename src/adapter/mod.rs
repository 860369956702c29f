//! Target-tree adapter contract.
//!
//! The reconciler never touches a concrete tree. It drives an [`Adapter`]
//! that creates nodes, writes text and properties, attaches listeners and
//! places handles. Placement goes through the [`BatchAdapter`], which
//! coalesces intents over a short window before forwarding them.
//!
//! # Positions
//!
//! A [`Position`] names the parent and carries lazy sibling lookups. The
//! lookups are resolved when the adapter applies the operation, not when the
//! reconciler computes the position, so siblings mounted later in the same
//! pass are seen.

pub mod batch;
pub mod testing;

use std::fmt;
use std::rc::Rc;

use crate::types::{Callback, Cleanup, Handle, Value};

pub use batch::BatchAdapter;

// =============================================================================
// Position
// =============================================================================

/// Resolves a sibling handle at placement time.
pub type SiblingLookup = Rc<dyn Fn() -> Option<Handle>>;

/// Where a handle belongs: a parent and lazily resolved neighbours.
#[derive(Clone)]
pub struct Position {
    parent: Handle,
    previous: Option<SiblingLookup>,
    next: Option<SiblingLookup>,
}

/// Resolved insertion point inside a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    After(Handle),
    Start,
}

impl Position {
    pub fn new(parent: Handle, previous: Option<SiblingLookup>, next: Option<SiblingLookup>) -> Self {
        Self { parent, previous, next }
    }

    /// First slot of `parent`, with no siblings to consult.
    pub fn root(parent: Handle) -> Self {
        Self::new(parent, None, None)
    }

    pub fn parent(&self) -> Handle {
        self.parent
    }

    /// Last handle of the nearest placed previous sibling.
    pub fn previous(&self) -> Option<Handle> {
        self.previous.as_ref().and_then(|lookup| lookup())
    }

    /// First handle of the nearest placed next sibling.
    pub fn next(&self) -> Option<Handle> {
        self.next.as_ref().and_then(|lookup| lookup())
    }

    pub fn anchor(&self) -> Anchor {
        match self.previous() {
            Some(handle) => Anchor::After(handle),
            None => Anchor::Start,
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("parent", &self.parent)
            .field("previous", &self.previous.is_some())
            .field("next", &self.next.is_some())
            .finish()
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Changed prop names split by how they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub props: Vec<String>,
    pub events: Vec<String>,
}

/// Capabilities the reconciler needs from the tree it renders into.
pub trait Adapter {
    fn create_text(&self, text: &str) -> Handle;

    fn create_element(&self, tag: &str) -> Handle;

    fn set_text(&self, handle: Handle, text: &str);

    fn set_property(&self, handle: Handle, name: &str, value: &Value);

    /// Attach `callback` to `event` on `handle`. The returned closure detaches it.
    fn listen(&self, handle: Handle, event: &str, callback: Callback) -> Cleanup;

    /// Split prop names into plain properties and event listeners.
    ///
    /// Defaults to treating `onXxx` names as events.
    fn classify_names(&self, names: &[String]) -> Classified {
        let (events, props) = names.iter().cloned().partition(|name| is_event_prop(name));
        Classified { props, events }
    }

    /// Event name to listen for, given an event prop name.
    fn event_name(&self, prop: &str) -> String {
        prop.strip_prefix("on").unwrap_or(prop).to_lowercase()
    }

    /// Insert a detached handle at `position`.
    fn place(&self, handle: Handle, position: &Position);

    /// Reposition an attached handle.
    fn move_to(&self, handle: Handle, position: &Position);

    /// Detach `handle` from `parent`.
    fn remove(&self, handle: Handle, parent: Handle);
}

/// `onClick`-style prop name.
pub fn is_event_prop(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}
