//! Node factory used by the authoring layer.
//!
//! Tag and component sugar compiles down to these calls. Every call-site
//! passes an id that is unique to that call-site and stable across renders.
//!
//! ```ignore
//! let list = element("ul", "ul").children(items.iter().map(|item| {
//!     element("li", "li").key(item.id.as_str()).child(item.label.as_str())
//! }));
//! ```

use super::prop::{PropMap, PropValue};
use super::render_node::{
    ComponentNode, ElementNode, FragmentNode, RenderNode, RenderTree, SuspenseNode, TextNode,
};
use crate::component::ComponentRef;
use crate::reactive::Stream;
use crate::types::{Callback, Event, Key, NodeId, Value};

// =============================================================================
// Builders
// =============================================================================

pub fn element(id: impl Into<NodeId>, tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder(ElementNode {
        id: id.into(),
        key: None,
        tag: tag.into(),
        props: PropMap::new(),
        children: Vec::new(),
    })
}

pub struct ElementBuilder(ElementNode);

impl ElementBuilder {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.0.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.0.props.insert(name.into(), value.into());
        self
    }

    /// Attach an event listener. `on("click", ..)` sets the `onClick` prop.
    pub fn on(self, event: &str, listener: impl Fn(&Event) + 'static) -> Self {
        let mut chars = event.chars();
        let name = match chars.next() {
            Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
            None => "on".to_string(),
        };
        self.prop(name, Callback::new(listener))
    }

    pub fn child(mut self, child: impl Into<RenderTree>) -> Self {
        self.0.children.push(child.into());
        self
    }

    pub fn children<T: Into<RenderTree>>(mut self, children: impl IntoIterator<Item = T>) -> Self {
        self.0.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> RenderNode {
        RenderNode::Element(self.0)
    }
}

pub fn component(id: impl Into<NodeId>, component: &ComponentRef) -> ComponentBuilder {
    ComponentBuilder(ComponentNode {
        id: id.into(),
        key: None,
        component: component.clone(),
        props: PropMap::new(),
    })
}

pub struct ComponentBuilder(ComponentNode);

impl ComponentBuilder {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.0.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.0.props.insert(name.into(), value.into());
        self
    }

    /// Pass a subtree as the `children` prop.
    pub fn children(self, children: impl Into<RenderTree>) -> Self {
        let tree: RenderTree = children.into();
        self.prop("children", Value::from(tree))
    }

    pub fn build(self) -> RenderNode {
        RenderNode::Component(self.0)
    }
}

pub fn fragment(id: impl Into<NodeId>) -> FragmentBuilder {
    FragmentBuilder(FragmentNode {
        id: id.into(),
        key: None,
        children: Vec::new(),
        positional: false,
    })
}

pub struct FragmentBuilder(FragmentNode);

impl FragmentBuilder {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.0.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: impl Into<RenderTree>) -> Self {
        self.0.children.push(child.into());
        self
    }

    pub fn children<T: Into<RenderTree>>(mut self, children: impl IntoIterator<Item = T>) -> Self {
        self.0.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> RenderNode {
        RenderNode::Fragment(self.0)
    }
}

/// Text node with an explicit id.
pub fn text(id: impl Into<NodeId>, value: impl Into<Value>) -> RenderTree {
    RenderNode::Text(TextNode {
        id: id.into(),
        value: value.into(),
    })
    .into()
}

pub fn suspense(
    id: impl Into<NodeId>,
    fallback: impl Into<RenderTree>,
    children: impl Into<RenderTree>,
) -> SuspenseBuilder {
    SuspenseBuilder(SuspenseNode {
        id: id.into(),
        key: None,
        fallback: Box::new(fallback.into()),
        children: Box::new(children.into()),
    })
}

pub struct SuspenseBuilder(SuspenseNode);

impl SuspenseBuilder {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.0.key = Some(key.into());
        self
    }

    pub fn build(self) -> RenderNode {
        RenderNode::Suspense(self.0)
    }
}

// =============================================================================
// Generic Factory
// =============================================================================

/// What a `jsx` call instantiates.
#[derive(Debug, Clone)]
pub enum JsxType {
    Tag(String),
    Component(ComponentRef),
    Fragment,
    /// Reads its fallback from the `fallback` prop.
    Suspense,
}

impl From<&str> for JsxType {
    fn from(tag: &str) -> Self {
        JsxType::Tag(tag.to_string())
    }
}

impl From<&ComponentRef> for JsxType {
    fn from(component: &ComponentRef) -> Self {
        JsxType::Component(component.clone())
    }
}

/// Build a node from an id, a tag or component, a prop map and children.
///
/// A `key` prop is lifted out of the map into the node's key.
pub fn jsx(id: impl Into<NodeId>, kind: impl Into<JsxType>, mut props: PropMap, children: Vec<RenderTree>) -> RenderNode {
    let id = id.into();
    let key = props.shift_remove("key").and_then(|key| match key.current() {
        Some(Value::Str(s)) => Some(Key::from(s)),
        Some(Value::Int(i)) => Some(Key::Int(i)),
        _ => None,
    });

    match kind.into() {
        JsxType::Tag(tag) => RenderNode::Element(ElementNode {
            id,
            key,
            tag,
            props,
            children,
        }),
        JsxType::Component(component) => {
            if !children.is_empty() {
                let tree = single_or_list(children);
                props.insert("children".to_string(), PropValue::Static(Value::from(tree)));
            }
            RenderNode::Component(ComponentNode {
                id,
                key,
                component,
                props,
            })
        }
        JsxType::Fragment => RenderNode::Fragment(FragmentNode {
            id,
            key,
            children,
            positional: false,
        }),
        JsxType::Suspense => {
            let fallback = match props.shift_remove("fallback").and_then(|p| p.current()) {
                Some(Value::Tree(tree)) => tree.as_ref().clone(),
                Some(value) => RenderTree::Text(value),
                None => RenderTree::Empty,
            };
            RenderNode::Suspense(SuspenseNode {
                id,
                key,
                fallback: Box::new(fallback),
                children: Box::new(single_or_list(children)),
            })
        }
    }
}

fn single_or_list(mut children: Vec<RenderTree>) -> RenderTree {
    if children.len() == 1 {
        children.remove(0)
    } else {
        RenderTree::List(children)
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<RenderNode> for RenderTree {
    fn from(node: RenderNode) -> Self {
        RenderTree::Node(Box::new(node))
    }
}

impl From<ElementBuilder> for RenderTree {
    fn from(builder: ElementBuilder) -> Self {
        builder.build().into()
    }
}

impl From<ComponentBuilder> for RenderTree {
    fn from(builder: ComponentBuilder) -> Self {
        builder.build().into()
    }
}

impl From<FragmentBuilder> for RenderTree {
    fn from(builder: FragmentBuilder) -> Self {
        builder.build().into()
    }
}

impl From<SuspenseBuilder> for RenderTree {
    fn from(builder: SuspenseBuilder) -> Self {
        builder.build().into()
    }
}

impl From<Value> for RenderTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Tree(tree) => tree.as_ref().clone(),
            value => RenderTree::Text(value),
        }
    }
}

impl From<Stream<RenderTree>> for RenderTree {
    fn from(stream: Stream<RenderTree>) -> Self {
        RenderTree::Stream(stream)
    }
}

impl From<Stream<Value>> for RenderTree {
    fn from(stream: Stream<Value>) -> Self {
        RenderTree::Stream(stream.map(RenderTree::from))
    }
}

impl<T: Into<RenderTree>> From<Vec<T>> for RenderTree {
    fn from(items: Vec<T>) -> Self {
        RenderTree::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RenderTree>> From<Option<T>> for RenderTree {
    fn from(item: Option<T>) -> Self {
        item.map_or(RenderTree::Empty, Into::into)
    }
}

macro_rules! text_tree_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for RenderTree {
                fn from(value: $ty) -> Self {
                    RenderTree::Text(Value::from(value))
                }
            }
        )*
    };
}

text_tree_from!(&str, String, i64, i32, f64, bool);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentDef;

    #[test]
    fn test_element_builder() {
        let RenderNode::Element(node) = element("btn", "button")
            .key(2)
            .prop("class", "primary")
            .on("click", |_| {})
            .child("Save")
            .build()
        else {
            panic!("expected an element");
        };
        assert_eq!(node.key, Some(Key::Int(2)));
        assert!(node.props.contains_key("onClick"));
        assert_eq!(node.children, vec![RenderTree::from("Save")]);
    }

    #[test]
    fn test_jsx_lifts_key_and_children() {
        let def = ComponentDef::from_render("Card", |_| RenderTree::Empty).build();
        let mut props = PropMap::new();
        props.insert("key".into(), "k1".into());
        props.insert("title".into(), "Hello".into());

        let RenderNode::Component(node) = jsx("card", &def, props, vec!["body".into()]) else {
            panic!("expected a component");
        };
        assert_eq!(node.key, Some(Key::from("k1")));
        assert!(!node.props.contains_key("key"));
        assert_eq!(
            node.props.get("children"),
            Some(&PropValue::Static(Value::from(RenderTree::from("body"))))
        );
    }

    #[test]
    fn test_jsx_suspense_reads_fallback_prop() {
        let mut props = PropMap::new();
        props.insert("fallback".into(), Value::from(RenderTree::from("Loading")).into());
        let RenderNode::Suspense(node) = jsx("s", JsxType::Suspense, props, vec!["content".into()]) else {
            panic!("expected a suspense node");
        };
        assert_eq!(*node.fallback, RenderTree::from("Loading"));
        assert_eq!(*node.children, RenderTree::from("content"));
    }
}
