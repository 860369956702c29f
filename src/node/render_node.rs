use std::collections::HashSet;
use std::fmt;

use super::prop::PropMap;
use crate::component::ComponentRef;
use crate::reactive::Stream;
use crate::types::{Identity, Key, NodeId, Value};

// =============================================================================
// Render Tree
// =============================================================================

/// Anything that can be rendered: a node, a primitive, a list, or a stream
/// of trees.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderTree {
    /// Renders nothing.
    #[default]
    Empty,
    /// A primitive shown as text. `Value::Null` renders nothing.
    Text(Value),
    Node(Box<RenderNode>),
    /// Wrapped in an implicit positional fragment.
    List(Vec<RenderTree>),
    /// Re-resolved on every emission.
    Stream(Stream<RenderTree>),
}

// =============================================================================
// Render Nodes
// =============================================================================

/// Immutable snapshot of one logical tree position for one render pass.
///
/// Equality is gated on variant and id, then compares content shallowly
/// (recursing into nested trees).
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Text(TextNode),
    Element(ElementNode),
    Fragment(FragmentNode),
    Component(ComponentNode),
    Suspense(SuspenseNode),
    Observable(ObservableNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub id: NodeId,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub id: NodeId,
    pub key: Option<Key>,
    pub tag: String,
    pub props: PropMap,
    pub children: Vec<RenderTree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentNode {
    pub id: NodeId,
    pub key: Option<Key>,
    pub children: Vec<RenderTree>,
    /// Unkeyed children are matched by position. Set for list-derived
    /// fragments only.
    pub positional: bool,
}

/// Equal when the component reference is the same and props are shallowly
/// equal. Content is compared by the component's own render stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: NodeId,
    pub key: Option<Key>,
    pub component: ComponentRef,
    pub props: PropMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuspenseNode {
    pub id: NodeId,
    pub key: Option<Key>,
    pub fallback: Box<RenderTree>,
    pub children: Box<RenderTree>,
}

/// A bare stream found in child position.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableNode {
    pub id: NodeId,
    pub stream: Stream<RenderTree>,
}

/// Variant tag of a [`RenderNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Element,
    Fragment,
    Component,
    Suspense,
    Observable,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Element => "element",
            NodeKind::Fragment => "fragment",
            NodeKind::Component => "component",
            NodeKind::Suspense => "suspense",
            NodeKind::Observable => "observable",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RenderNode {
    pub fn id(&self) -> &NodeId {
        match self {
            RenderNode::Text(node) => &node.id,
            RenderNode::Element(node) => &node.id,
            RenderNode::Fragment(node) => &node.id,
            RenderNode::Component(node) => &node.id,
            RenderNode::Suspense(node) => &node.id,
            RenderNode::Observable(node) => &node.id,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            RenderNode::Element(node) => node.key.as_ref(),
            RenderNode::Fragment(node) => node.key.as_ref(),
            RenderNode::Component(node) => node.key.as_ref(),
            RenderNode::Suspense(node) => node.key.as_ref(),
            RenderNode::Text(_) | RenderNode::Observable(_) => None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.id().clone(), self.key().cloned())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            RenderNode::Text(_) => NodeKind::Text,
            RenderNode::Element(_) => NodeKind::Element,
            RenderNode::Fragment(_) => NodeKind::Fragment,
            RenderNode::Component(_) => NodeKind::Component,
            RenderNode::Suspense(_) => NodeKind::Suspense,
            RenderNode::Observable(_) => NodeKind::Observable,
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a raw tree found at `index` among its siblings.
///
/// Returns `None` for trees that render nothing. Lists become positional
/// fragments and bare streams become observable nodes, both with ids derived
/// from `index`.
pub fn to_render_node(raw: &RenderTree, index: usize) -> Option<RenderNode> {
    match raw {
        RenderTree::Empty => None,
        RenderTree::Text(Value::Null) => None,
        RenderTree::Text(value) => Some(RenderNode::Text(TextNode {
            id: NodeId::from(format!("text:{index}")),
            value: value.clone(),
        })),
        RenderTree::Node(node) => match node.as_ref() {
            RenderNode::Text(text) if text.value.is_null() => None,
            node => Some(node.clone()),
        },
        RenderTree::List(items) => Some(RenderNode::Fragment(FragmentNode {
            id: NodeId::from(format!("fragment:{index}")),
            key: None,
            children: items.clone(),
            positional: true,
        })),
        RenderTree::Stream(stream) => Some(RenderNode::Observable(ObservableNode {
            id: NodeId::from(format!("observable:{index}")),
            stream: stream.clone(),
        })),
    }
}

/// Children normalized and keyed for diffing.
#[derive(Debug, Default)]
pub struct CollectedChildren {
    pub nodes: Vec<(Identity, RenderNode)>,
    /// Identities that appeared more than once. Only the first occurrence
    /// is kept in `nodes`.
    pub duplicates: Vec<Identity>,
}

/// Normalize a child list. With `positional`, unkeyed children are keyed by
/// their index.
pub fn collect_children(children: &[RenderTree], positional: bool) -> CollectedChildren {
    let mut seen = HashSet::new();
    let mut collected = CollectedChildren::default();

    for (index, child) in children.iter().enumerate() {
        let Some(node) = to_render_node(child, index) else {
            continue;
        };
        let mut identity = node.identity();
        if positional && identity.key.is_none() {
            identity.key = Some(Key::from(index));
        }
        if seen.insert(identity.clone()) {
            collected.nodes.push((identity, node));
        } else {
            collected.duplicates.push(identity);
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::factory::{element, text};

    #[test]
    fn test_primitives_become_text_nodes() {
        let node = to_render_node(&RenderTree::from("hi"), 3).unwrap();
        assert_eq!(node.id().as_str(), "text:3");
        assert_eq!(node.kind(), NodeKind::Text);
        assert!(to_render_node(&RenderTree::Text(Value::Null), 0).is_none());
        assert!(to_render_node(&RenderTree::Empty, 0).is_none());
    }

    #[test]
    fn test_lists_become_positional_fragments() {
        let list = RenderTree::List(vec!["a".into(), "b".into()]);
        let Some(RenderNode::Fragment(fragment)) = to_render_node(&list, 1) else {
            panic!("expected a fragment");
        };
        assert_eq!(fragment.id.as_str(), "fragment:1");
        assert!(fragment.positional);
        assert_eq!(fragment.children.len(), 2);
    }

    #[test]
    fn test_equality_is_id_gated() {
        let a = element("li", "li").child("x").build();
        let b = element("li", "li").child("x").build();
        let c = element("other", "li").child("x").build();
        let d = element("li", "li").child("y").build();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_collect_children_skips_duplicates() {
        let children = vec![
            element("li", "li").key("a").into(),
            element("li", "li").key("b").into(),
            element("li", "li").key("a").into(),
            RenderTree::Empty,
            text("label", "x"),
        ];
        let collected = collect_children(&children, false);
        let ids: Vec<String> = collected.nodes.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["li[a]", "li[b]", "label"]);
        assert_eq!(collected.duplicates.len(), 1);
    }

    #[test]
    fn test_positional_keys() {
        let children = vec![element("li", "li").into(), element("li", "li").into()];
        let collected = collect_children(&children, true);
        assert_eq!(collected.nodes.len(), 2);
        assert_eq!(collected.nodes[1].0.key, Some(Key::Int(1)));
        assert!(collected.duplicates.is_empty());

        let unkeyed = collect_children(&children, false);
        assert_eq!(unkeyed.nodes.len(), 1);
    }
}
