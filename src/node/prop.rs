//! Prop values and shallow prop-map comparison.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use spark_signals::Signal;

use crate::reactive::Stream;
use crate::types::{Callback, NodeRef, Value};

/// A prop as written at the call-site: a plain value or a reactive one.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Static(Value),
    Stream(Stream<Value>),
}

impl PropValue {
    /// Whether the prop is currently loading.
    pub fn is_pending(&self) -> bool {
        match self {
            PropValue::Static(_) => false,
            PropValue::Stream(stream) => stream.is_pending(),
        }
    }

    /// Current value. `None` for a stream that has not emitted yet.
    pub fn current(&self) -> Option<Value> {
        match self {
            PropValue::Static(value) => Some(value.clone()),
            PropValue::Stream(stream) => stream.current(),
        }
    }

    /// The prop as a stream, wrapping static values in a constant.
    pub fn to_stream(&self) -> Stream<Value> {
        match self {
            PropValue::Static(value) => Stream::constant(value.clone()),
            PropValue::Stream(stream) => stream.clone(),
        }
    }
}

/// Props in call-site order.
pub type PropMap = IndexMap<String, PropValue>;

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Static(value)
    }
}

impl From<Stream<Value>> for PropValue {
    fn from(stream: Stream<Value>) -> Self {
        PropValue::Stream(stream)
    }
}

impl From<Signal<Value>> for PropValue {
    fn from(signal: Signal<Value>) -> Self {
        PropValue::Stream(Stream::from_signal(signal))
    }
}

macro_rules! static_prop_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    PropValue::Static(Value::from(value))
                }
            }
        )*
    };
}

static_prop_from!(&str, String, i64, i32, f64, bool, Callback, NodeRef);

/// Names whose value differs between `prev` and `next`, including names
/// present on one side only. Ordered by first appearance in `prev`, then
/// `next`.
pub fn shallow_diff(prev: &PropMap, next: &PropMap) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut changed = Vec::new();

    for (name, value) in prev {
        seen.insert(name.as_str());
        if next.get(name) != Some(value) {
            changed.push(name.clone());
        }
    }
    for name in next.keys() {
        if !seen.contains(name.as_str()) {
            changed.push(name.clone());
        }
    }
    changed
}

pub fn shallow_equal(a: &PropMap, b: &PropMap) -> bool {
    a.len() == b.len() && a.iter().all(|(name, value)| b.get(name) == Some(value))
}
