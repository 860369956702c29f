//! Components and their inputs.

pub mod definition;
pub mod input;

pub use definition::{ComponentDef, ComponentRef, RenderFn};
pub use input::Input;

use crate::error::Result;
use crate::reactive::{Context, ContextMap, Stream};

/// Per-instance scope passed to a render function.
///
/// Contexts provided here are visible to everything the component renders.
#[derive(Debug, Clone)]
pub struct Scope {
    context: ContextMap,
}

impl Scope {
    pub(crate) fn new(context: ContextMap) -> Self {
        Self { context }
    }

    pub fn provide<T: Clone + PartialEq + 'static>(&self, context: &Context<T>, value: Stream<T>) {
        self.context.provide(context, value);
    }

    pub fn require<T: Clone + PartialEq + 'static>(&self, context: &Context<T>) -> Result<Stream<T>> {
        self.context.require(context)
    }

    pub fn optional<T: Clone + PartialEq + 'static>(&self, context: &Context<T>) -> Stream<T> {
        self.context.optional(context)
    }

    pub fn context(&self) -> &ContextMap {
        &self.context
    }
}
