//! Pending values, placeholders and suspense boundaries through the public
//! mount API.

use std::rc::Rc;
use std::time::Duration;

use spark_reconcile::adapter::testing::{Op, RecordingAdapter, RecordingLogger};
use spark_reconcile::{
    component, element, mount, suspense, ComponentDef, ComponentRef, MountHandle, RenderOptions,
    RenderTree, Stream, Value,
};
use spark_signals::{signal, Signal};

const MS: Duration = Duration::from_millis(1);

fn created_text(adapter: &RecordingAdapter, text: &str) -> bool {
    adapter
        .ops()
        .iter()
        .any(|op| matches!(op, Op::CreateText { text: created, .. } if created == text))
}

fn slow_counter() -> ComponentRef {
    ComponentDef::from_render("Counter", |props| {
        RenderTree::Text(props.get("count").cloned().unwrap_or_default())
    })
    .with_placeholder(|| "loading".into())
    .build()
}

fn mount_counter(count: &Signal<Option<Value>>, options: RenderOptions) -> (Rc<RecordingAdapter>, MountHandle) {
    let adapter = RecordingAdapter::new();
    let tree = component("counter", &slow_counter())
        .prop("count", Stream::from_deferred(count.clone()))
        .build();
    let handle = mount(tree, adapter.root(), adapter.clone(), options.unbatched()).unwrap();
    (adapter, handle)
}

#[test]
fn test_fast_value_never_flashes_placeholder() {
    let count = signal(None::<Value>);
    let (adapter, handle) = mount_counter(&count, RenderOptions::new().pending_debounce(5 * MS));

    handle.advance(2 * MS).unwrap();
    count.set(Some(Value::Int(1)));
    handle.settle().unwrap();

    assert_eq!(adapter.html(), "1");
    assert!(!created_text(&adapter, "loading"));
}

#[test]
fn test_slow_value_shows_placeholder_after_window() {
    let count = signal(None::<Value>);
    let (adapter, handle) = mount_counter(&count, RenderOptions::new().pending_debounce(5 * MS));

    handle.advance(4 * MS).unwrap();
    assert_eq!(adapter.html(), "");

    handle.advance(MS).unwrap();
    assert_eq!(adapter.html(), "loading");

    count.set(Some(Value::Int(2)));
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "2");
}

#[test]
fn test_later_pending_brings_placeholder_back() {
    let count = signal(Some(Value::Int(1)));
    let (adapter, handle) = mount_counter(&count, RenderOptions::new());
    assert_eq!(adapter.html(), "1");

    count.set(None);
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "loading");

    count.set(Some(Value::Int(5)));
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "5");
}

#[test]
fn test_boundary_shows_fallback_while_pending() {
    let adapter = RecordingAdapter::new();
    let logger = RecordingLogger::new();
    let title = signal(None::<Value>);
    let content = element("article", "article")
        .prop("title", Stream::from_deferred(title.clone()))
        .child("body");
    let tree = element("page", "main").child(suspense("boundary", "wait", content));

    let handle = mount(
        tree,
        adapter.root(),
        adapter.clone(),
        RenderOptions::new().unbatched().logger(logger.clone()),
    )
    .unwrap();
    handle.advance(MS).unwrap();
    assert_eq!(adapter.html(), "<main>wait</main>");

    title.set(Some(Value::from("ready")));
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "<main><article title=\"ready\">body</article></main>");

    // The boundary absorbed the suspension.
    assert!(!handle.is_suspended());
    assert_eq!(logger.count("suspension_without_boundary"), 0);
}

#[test]
fn test_rapid_suspend_resume_never_swaps() {
    let adapter = RecordingAdapter::new();
    let pending = signal(false);
    let label = Stream::constant(Value::from("x")).with_pending_signal(pending.clone());
    let tree = suspense("boundary", "wait", element("label", "span").prop("label", label));

    let handle = mount(tree, adapter.root(), adapter.clone(), RenderOptions::new().unbatched()).unwrap();
    assert_eq!(adapter.html(), "<span label=\"x\"></span>");

    pending.set(true);
    handle.flush().unwrap();
    pending.set(false);
    handle.flush().unwrap();
    handle.settle().unwrap();

    assert_eq!(adapter.html(), "<span label=\"x\"></span>");
    assert!(!created_text(&adapter, "wait"));
}

#[test]
fn test_suspension_without_boundary_warns() {
    let adapter = RecordingAdapter::new();
    let logger = RecordingLogger::new();
    let title = signal(None::<Value>);
    let tree = element("card", "section").prop("title", Stream::from_deferred(title.clone()));

    let handle = mount(
        tree,
        adapter.root(),
        adapter.clone(),
        RenderOptions::new().unbatched().logger(logger.clone()),
    )
    .unwrap();
    assert!(!handle.is_suspended());

    handle.advance(MS).unwrap();
    assert!(handle.is_suspended());
    assert_eq!(logger.count("suspension_without_boundary"), 1);
    // Content stays in place.
    assert_eq!(adapter.html(), "<section></section>");

    title.set(Some(Value::from("t")));
    handle.settle().unwrap();
    assert!(!handle.is_suspended());
    assert_eq!(adapter.html(), "<section title=\"t\"></section>");
}

#[test]
fn test_component_without_placeholder_suspends_boundary() {
    let adapter = RecordingAdapter::new();
    let count = signal(None::<Value>);
    let plain = ComponentDef::from_render("Plain", |props| {
        RenderTree::Text(props.get("count").cloned().unwrap_or_default())
    })
    .build();
    let tree = suspense(
        "boundary",
        "wait",
        component("plain", &plain).prop("count", Stream::from_deferred(count.clone())),
    );

    let handle = mount(tree, adapter.root(), adapter.clone(), RenderOptions::new().unbatched()).unwrap();
    handle.advance(MS).unwrap();
    assert_eq!(adapter.html(), "wait");

    count.set(Some(Value::Int(9)));
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "9");
}

#[test]
fn test_swap_and_swap_back_inside_batch_window_commits_nothing() {
    let adapter = RecordingAdapter::new();
    let logger = RecordingLogger::new();
    let pending = signal(false);
    let label = Stream::constant(Value::from("x")).with_pending_signal(pending.clone());
    let items = RenderTree::List(vec![
        element("item", "li").key("a").prop("label", label).child("a").into(),
        element("item", "li").key("b").child("b").into(),
    ]);
    let tree = element("list", "ul").child(suspense("boundary", "wait", items));

    let handle = mount(
        tree,
        adapter.root(),
        adapter.clone(),
        RenderOptions::new().logger(logger.clone()),
    )
    .unwrap();
    handle.settle().unwrap();
    assert_eq!(adapter.html(), "<ul><li label=\"x\">a</li><li>b</li></ul>");
    adapter.take_ops();

    pending.set(true);
    handle.advance(2 * MS).unwrap();
    // The fallback went in and the items came out, inside the window.
    assert_eq!(logger.count("publish remove"), 2);
    assert!(adapter.structural_ops().is_empty());

    pending.set(false);
    handle.advance(2 * MS).unwrap();
    handle.settle().unwrap();

    assert!(adapter.structural_ops().is_empty(), "{:?}", adapter.structural_ops());
    assert_eq!(adapter.html(), "<ul><li label=\"x\">a</li><li>b</li></ul>");
}
