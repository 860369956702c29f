//! In-memory adapter and logger for tests.
//!
//! [`RecordingAdapter`] keeps a real parent/children tree, records every call
//! it receives as an [`Op`], and renders subtrees to compact markup:
//!
//! ```ignore
//! let adapter = RecordingAdapter::new();
//! let handle = mount(tree, adapter.root(), adapter.clone(), RenderOptions::new().unbatched())?;
//! assert_eq!(adapter.html(), "<ul><li>a</li><li>b</li></ul>");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{Adapter, Anchor, Position};
use crate::logger::Logger;
use crate::types::{Callback, Cleanup, Event, Handle, Identity, Value};

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    CreateText { handle: Handle, text: String },
    CreateElement { handle: Handle, tag: String },
    SetText { handle: Handle, text: String },
    SetProperty { handle: Handle, name: String, value: Value },
    Listen { handle: Handle, event: String },
    Unlisten { handle: Handle, event: String },
    Place { handle: Handle, parent: Handle, after: Option<Handle> },
    Move { handle: Handle, parent: Handle, after: Option<Handle> },
    Remove { handle: Handle, parent: Handle },
}

impl Op {
    /// Handle the operation applies to.
    pub fn handle(&self) -> Handle {
        match self {
            Op::CreateText { handle, .. }
            | Op::CreateElement { handle, .. }
            | Op::SetText { handle, .. }
            | Op::SetProperty { handle, .. }
            | Op::Listen { handle, .. }
            | Op::Unlisten { handle, .. }
            | Op::Place { handle, .. }
            | Op::Move { handle, .. }
            | Op::Remove { handle, .. } => *handle,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Op::Place { .. } | Op::Move { .. } | Op::Remove { .. })
    }
}

enum Content {
    Text(String),
    Element { tag: String, props: IndexMap<String, Value> },
}

struct Record {
    content: Content,
    parent: Option<Handle>,
    children: Vec<Handle>,
    listeners: Vec<(u64, String, Callback)>,
}

#[derive(Default)]
struct State {
    next_handle: u64,
    next_listener: u64,
    nodes: HashMap<Handle, Record>,
    ops: Vec<Op>,
}

/// Adapter backed by an in-memory tree.
pub struct RecordingAdapter {
    state: RefCell<State>,
    root: Handle,
    this: Weak<Self>,
}

impl RecordingAdapter {
    /// New adapter with a detached `root` element to mount into.
    pub fn new() -> Rc<Self> {
        let mut state = State::default();
        let root = Handle(state.next_handle);
        state.next_handle += 1;
        state.nodes.insert(
            root,
            Record {
                content: Content::Element {
                    tag: "root".into(),
                    props: IndexMap::new(),
                },
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            },
        );
        Rc::new_cyclic(|this| Self {
            state: RefCell::new(state),
            root,
            this: this.clone(),
        })
    }

    pub fn root(&self) -> Handle {
        self.root
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    /// Recorded operations since the last call, clearing the log.
    pub fn take_ops(&self) -> Vec<Op> {
        std::mem::take(&mut self.state.borrow_mut().ops)
    }

    /// Recorded place/move/remove operations.
    pub fn structural_ops(&self) -> Vec<Op> {
        self.ops().into_iter().filter(Op::is_structural).collect()
    }

    pub fn children(&self, handle: Handle) -> Vec<Handle> {
        self.state
            .borrow()
            .nodes
            .get(&handle)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        self.state.borrow().nodes.get(&handle).and_then(|record| record.parent)
    }

    pub fn text(&self, handle: Handle) -> Option<String> {
        match &self.state.borrow().nodes.get(&handle)?.content {
            Content::Text(text) => Some(text.clone()),
            Content::Element { .. } => None,
        }
    }

    pub fn tag(&self, handle: Handle) -> Option<String> {
        match &self.state.borrow().nodes.get(&handle)?.content {
            Content::Element { tag, .. } => Some(tag.clone()),
            Content::Text(_) => None,
        }
    }

    pub fn property(&self, handle: Handle, name: &str) -> Option<Value> {
        match &self.state.borrow().nodes.get(&handle)?.content {
            Content::Element { props, .. } => props.get(name).cloned(),
            Content::Text(_) => None,
        }
    }

    pub fn listener_count(&self, handle: Handle) -> usize {
        self.state
            .borrow()
            .nodes
            .get(&handle)
            .map_or(0, |record| record.listeners.len())
    }

    /// Invoke every listener registered for `event` on `handle`.
    /// Returns how many ran.
    pub fn dispatch(&self, handle: Handle, event: &str, payload: Value) -> usize {
        let callbacks: Vec<Callback> = self
            .state
            .borrow()
            .nodes
            .get(&handle)
            .map(|record| {
                record
                    .listeners
                    .iter()
                    .filter(|(_, name, _)| name == event)
                    .map(|(_, _, callback)| callback.clone())
                    .collect()
            })
            .unwrap_or_default();

        let event = Event {
            name: event.to_string(),
            payload,
        };
        for callback in &callbacks {
            callback.call(&event);
        }
        callbacks.len()
    }

    /// Markup of everything mounted under the root.
    pub fn html(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        if let Some(root) = state.nodes.get(&self.root) {
            for child in &root.children {
                render_into(&state, *child, &mut out);
            }
        }
        out
    }

    /// Markup of `handle` and its subtree.
    pub fn render(&self, handle: Handle) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        render_into(&state, handle, &mut out);
        out
    }

    fn create(&self, content: Content) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = Handle(state.next_handle);
        state.next_handle += 1;
        state.nodes.insert(
            handle,
            Record {
                content,
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            },
        );
        handle
    }

    fn insert(&self, handle: Handle, parent: Handle, anchor: Anchor) {
        let mut state = self.state.borrow_mut();
        detach(&mut state, handle);

        let Some(siblings) = state.nodes.get_mut(&parent).map(|record| &mut record.children) else {
            panic!("insert into unknown parent {parent}");
        };
        let index = match anchor {
            Anchor::After(previous) => match siblings.iter().position(|sibling| *sibling == previous) {
                Some(i) => i + 1,
                None => panic!("anchor {previous} is not a child of {parent}"),
            },
            Anchor::Start => 0,
        };
        siblings.insert(index, handle);
        if let Some(record) = state.nodes.get_mut(&handle) {
            record.parent = Some(parent);
        }
    }
}

fn detach(state: &mut State, handle: Handle) {
    let Some(parent) = state.nodes.get_mut(&handle).and_then(|record| record.parent.take()) else {
        return;
    };
    if let Some(record) = state.nodes.get_mut(&parent) {
        record.children.retain(|child| *child != handle);
    }
}

fn render_into(state: &State, handle: Handle, out: &mut String) {
    let Some(record) = state.nodes.get(&handle) else {
        return;
    };
    match &record.content {
        Content::Text(text) => out.push_str(text),
        Content::Element { tag, props } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in props {
                if let Some(text) = value.to_text() {
                    out.push_str(&format!(" {name}=\"{text}\""));
                }
            }
            out.push('>');
            for child in &record.children {
                render_into(state, *child, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

impl Adapter for RecordingAdapter {
    fn create_text(&self, text: &str) -> Handle {
        let handle = self.create(Content::Text(text.to_string()));
        self.state.borrow_mut().ops.push(Op::CreateText {
            handle,
            text: text.to_string(),
        });
        handle
    }

    fn create_element(&self, tag: &str) -> Handle {
        let handle = self.create(Content::Element {
            tag: tag.to_string(),
            props: IndexMap::new(),
        });
        self.state.borrow_mut().ops.push(Op::CreateElement {
            handle,
            tag: tag.to_string(),
        });
        handle
    }

    fn set_text(&self, handle: Handle, text: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(Record {
            content: Content::Text(current),
            ..
        }) = state.nodes.get_mut(&handle)
        {
            *current = text.to_string();
        }
        state.ops.push(Op::SetText {
            handle,
            text: text.to_string(),
        });
    }

    fn set_property(&self, handle: Handle, name: &str, value: &Value) {
        let mut state = self.state.borrow_mut();
        if let Some(Record {
            content: Content::Element { props, .. },
            ..
        }) = state.nodes.get_mut(&handle)
        {
            if value.is_null() {
                props.shift_remove(name);
            } else {
                props.insert(name.to_string(), value.clone());
            }
        }
        state.ops.push(Op::SetProperty {
            handle,
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn listen(&self, handle: Handle, event: &str, callback: Callback) -> Cleanup {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_listener;
            state.next_listener += 1;
            if let Some(record) = state.nodes.get_mut(&handle) {
                record.listeners.push((id, event.to_string(), callback));
            }
            state.ops.push(Op::Listen {
                handle,
                event: event.to_string(),
            });
            id
        };

        let event = event.to_string();
        let adapter = self.this.clone();
        Box::new(move || {
            if let Some(adapter) = adapter.upgrade() {
                let mut state = adapter.state.borrow_mut();
                if let Some(record) = state.nodes.get_mut(&handle) {
                    record.listeners.retain(|(listener, _, _)| *listener != id);
                }
                state.ops.push(Op::Unlisten { handle, event });
            }
        })
    }

    fn place(&self, handle: Handle, position: &Position) {
        let anchor = position.anchor();
        self.insert(handle, position.parent(), anchor);
        self.state.borrow_mut().ops.push(Op::Place {
            handle,
            parent: position.parent(),
            after: anchor_handle(anchor),
        });
    }

    fn move_to(&self, handle: Handle, position: &Position) {
        let anchor = position.anchor();
        self.insert(handle, position.parent(), anchor);
        self.state.borrow_mut().ops.push(Op::Move {
            handle,
            parent: position.parent(),
            after: anchor_handle(anchor),
        });
    }

    fn remove(&self, handle: Handle, parent: Handle) {
        let mut state = self.state.borrow_mut();
        if state.nodes.get(&handle).and_then(|record| record.parent) == Some(parent) {
            detach(&mut state, handle);
        }
        state.ops.push(Op::Remove { handle, parent });
    }
}

fn anchor_handle(anchor: Anchor) -> Option<Handle> {
    match anchor {
        Anchor::After(handle) => Some(handle),
        Anchor::Start => None,
    }
}

// =============================================================================
// Recording Logger
// =============================================================================

/// Logger that keeps every hook call as a line of text.
#[derive(Default)]
pub struct RecordingLogger {
    lines: RefCell<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Number of lines starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lines.borrow().iter().filter(|line| line.starts_with(prefix)).count()
    }

    fn push(&self, line: String) {
        self.lines.borrow_mut().push(line);
    }
}

impl Logger for RecordingLogger {
    fn publish_event(&self, intent: &str, handle: Handle) {
        self.push(format!("publish {intent} {handle}"));
    }

    fn begin_batch(&self, pending: usize) {
        self.push(format!("begin_batch {pending}"));
    }

    fn complete_batch(&self, applied: usize, cancelled: usize) {
        self.push(format!("complete_batch {applied} {cancelled}"));
    }

    fn place_event(&self, handle: Handle, parent: Handle) {
        self.push(format!("place {handle} {parent}"));
    }

    fn move_event(&self, handle: Handle, parent: Handle) {
        self.push(format!("move {handle} {parent}"));
    }

    fn remove_event(&self, handle: Handle, parent: Handle) {
        self.push(format!("remove {handle} {parent}"));
    }

    fn node_mounted(&self, kind: &str, identity: &Identity) {
        self.push(format!("mounted {kind} {identity}"));
    }

    fn node_removed(&self, kind: &str, identity: &Identity) {
        self.push(format!("removed {kind} {identity}"));
    }

    fn duplicate_identity(&self, identity: &Identity) {
        self.push(format!("duplicate {identity}"));
    }

    fn suspension_without_boundary(&self) {
        self.push("suspension_without_boundary".to_string());
    }

    fn component_failed(&self, component: &str, props: &str, error: &dyn Error) {
        self.push(format!("component_failed {component} {props} {error}"));
    }
}
