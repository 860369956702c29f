//! Core types for spark-reconcile.
//!
//! These types are shared by every layer: the render node model describes
//! trees with them, the adapter contract speaks in [`Handle`]s, and the
//! reconciler keys its controllers by [`Identity`].

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use spark_signals::{signal, Signal};

use crate::node::RenderTree;
use crate::reactive::Stream;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Teardown closure returned by listeners and subscriptions.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Handle
// =============================================================================

/// Opaque reference to a node that lives in the target tree.
///
/// Handles are issued by the [`Adapter`](crate::adapter::Adapter); the
/// reconciler never looks inside them. An adapter typically uses the number as
/// an index into its own node storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Node Identity
// =============================================================================

/// Identifier assigned to a render node by the authoring layer.
///
/// Stable across renders of the same call-site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Rc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Rc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit key that distinguishes siblings produced by the same call-site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Identity used to match children between two renders: id plus optional key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub id: NodeId,
    pub key: Option<Key>,
}

impl Identity {
    pub fn new(id: NodeId, key: Option<Key>) -> Self {
        Self { id, key }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]", self.id, key),
            None => write!(f, "{}", self.id),
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Event delivered by the adapter to a listener registered through `on*` props.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: Value,
}

/// Event listener stored as a prop value.
///
/// Compared by pointer: two callbacks are the same prop value only if they
/// are the same closure.
#[derive(Clone)]
pub struct Callback(pub Rc<dyn Fn(&Event)>);

impl Callback {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

// =============================================================================
// Node Ref
// =============================================================================

static NEXT_REF_ID: AtomicU64 = AtomicU64::new(1);

/// Ref handle that receives the target handle of the element it is attached to.
///
/// The element controller writes the handle on mount and clears it on
/// unmount. The slot is a signal, so components can react to it through
/// [`NodeRef::stream`].
#[derive(Clone)]
pub struct NodeRef {
    id: u64,
    slot: Signal<Option<Handle>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self {
            id: NEXT_REF_ID.fetch_add(1, Ordering::Relaxed),
            slot: signal(None),
        }
    }

    /// Current handle, if the ref is attached.
    pub fn get(&self) -> Option<Handle> {
        self.slot.get()
    }

    pub(crate) fn set(&self, handle: Option<Handle>) {
        self.slot.set(handle);
    }

    /// Reactive view of the attached handle.
    pub fn stream(&self) -> Stream<Option<Handle>> {
        Stream::from_signal(self.slot.clone())
    }
}

impl Default for NodeRef {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({})", self.id)
    }
}

// =============================================================================
// Value
// =============================================================================

/// Plain (non-reactive) prop value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Nested render tree (e.g. `children` or `fallback` passed to a component).
    /// Compared structurally.
    Tree(Rc<RenderTree>),
    Callback(Callback),
    Ref(NodeRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text shown when the value is rendered as a text node.
    ///
    /// `None` for values that render nothing.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::List(items) => Some(
                items
                    .iter()
                    .filter_map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Tree(_) | Value::Callback(_) | Value::Ref(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Value::Callback(value)
    }
}

impl From<NodeRef> for Value {
    fn from(value: NodeRef) -> Self {
        Value::Ref(value)
    }
}

impl From<RenderTree> for Value {
    fn from(value: RenderTree) -> Self {
        Value::Tree(Rc::new(value))
    }
}

// =============================================================================
// Tests
// =============================================================================
