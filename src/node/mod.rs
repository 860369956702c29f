//! Render node model.
//!
//! A render pass produces an immutable tree of [`RenderNode`]s describing
//! what should exist. Raw shapes accepted at the boundary ([`RenderTree`]:
//! primitives, lists, bare streams) are normalized with [`to_render_node`].

pub mod factory;
pub mod prop;
pub mod render_node;

pub use factory::{
    component, element, fragment, jsx, suspense, text, ComponentBuilder, ElementBuilder,
    FragmentBuilder, JsxType, SuspenseBuilder,
};
pub use prop::{shallow_diff, shallow_equal, PropMap, PropValue};
pub use render_node::{
    collect_children, to_render_node, CollectedChildren, ComponentNode, ElementNode, FragmentNode,
    NodeKind, ObservableNode, RenderNode, RenderTree, SuspenseNode, TextNode,
};
