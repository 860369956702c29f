//! Batch window behavior through the public mount API.

use std::rc::Rc;
use std::time::Duration;

use spark_reconcile::adapter::testing::{Op, RecordingAdapter, RecordingLogger};
use spark_reconcile::{element, mount, Handle, MountHandle, RenderOptions, RenderTree};

const WINDOW: Duration = Duration::from_millis(10);

fn list(keys: &[&str]) -> RenderTree {
    element("list", "ul")
        .children(keys.iter().map(|key| element("item", "li").key(*key).child(*key)))
        .into()
}

fn mount_batched(tree: RenderTree) -> (Rc<RecordingAdapter>, Rc<RecordingLogger>, MountHandle) {
    let adapter = RecordingAdapter::new();
    let logger = RecordingLogger::new();
    let handle = mount(
        tree,
        adapter.root(),
        adapter.clone(),
        RenderOptions::new().logger(logger.clone()),
    )
    .unwrap();
    (adapter, logger, handle)
}

fn parent_of(op: &Op) -> Option<Handle> {
    match op {
        Op::Place { parent, .. } | Op::Move { parent, .. } | Op::Remove { parent, .. } => Some(*parent),
        _ => None,
    }
}

#[test]
fn test_mount_commits_after_window() {
    let (adapter, logger, handle) = mount_batched(element("app", "main").child("hello").into());

    // Handles exist, nothing is attached yet.
    assert_eq!(adapter.html(), "");
    assert!(adapter.structural_ops().is_empty());
    assert_eq!(logger.count("publish place"), 2);

    handle.advance(WINDOW - Duration::from_millis(1)).unwrap();
    assert_eq!(adapter.html(), "");

    handle.advance(Duration::from_millis(1)).unwrap();
    assert_eq!(adapter.html(), "<main>hello</main>");
    assert_eq!(adapter.structural_ops().len(), 2);
    assert_eq!(logger.count("begin_batch 2"), 1);
    assert_eq!(logger.count("complete_batch 2 0"), 1);
}

#[test]
fn test_place_and_remove_inside_window_cancel() {
    let (adapter, logger, handle) = mount_batched(list(&["a", "b"]));
    handle.advance(WINDOW).unwrap();
    let list_handle = adapter.children(adapter.root())[0];
    adapter.take_ops();

    handle.update(list(&["a", "b", "c"])).unwrap();
    handle.update(list(&["a", "b"])).unwrap();
    handle.advance(WINDOW).unwrap();

    assert!(adapter
        .structural_ops()
        .iter()
        .all(|op| parent_of(op) != Some(list_handle)));
    assert_eq!(adapter.html(), "<ul><li>a</li><li>b</li></ul>");
    // The item and its text were announced, only the detached text landed.
    assert_eq!(logger.count("begin_batch 3"), 1);
    assert_eq!(logger.count("complete_batch 1 2"), 1);
}

#[test]
fn test_window_restarts_on_every_intent() {
    let (adapter, _logger, handle) = mount_batched(list(&["a"]));
    handle.advance(WINDOW).unwrap();
    adapter.take_ops();

    handle.update(list(&["a", "b"])).unwrap();
    handle.advance(Duration::from_millis(6)).unwrap();
    handle.update(list(&["a", "b", "c"])).unwrap();
    handle.advance(Duration::from_millis(6)).unwrap();
    assert!(adapter.structural_ops().is_empty());

    handle.advance(Duration::from_millis(4)).unwrap();
    assert_eq!(adapter.html(), "<ul><li>a</li><li>b</li><li>c</li></ul>");
}

#[test]
fn test_insertions_resolve_anchors_at_commit() {
    let (adapter, _logger, handle) = mount_batched(list(&["a", "c"]));
    handle.advance(WINDOW).unwrap();

    handle.update(list(&["x", "a", "b", "c", "y"])).unwrap();
    handle.advance(WINDOW).unwrap();
    assert_eq!(
        adapter.html(),
        "<ul><li>x</li><li>a</li><li>b</li><li>c</li><li>y</li></ul>"
    );
}

#[test]
fn test_swap_commits_a_single_move() {
    let (adapter, logger, handle) = mount_batched(list(&["a", "b"]));
    handle.advance(WINDOW).unwrap();
    adapter.take_ops();

    handle.update(list(&["b", "a"])).unwrap();
    handle.advance(WINDOW).unwrap();

    let structural = adapter.structural_ops();
    assert_eq!(structural.len(), 1);
    assert!(matches!(structural[0], Op::Move { .. }));
    assert_eq!(logger.count("move "), 1);
    assert_eq!(adapter.html(), "<ul><li>b</li><li>a</li></ul>");
}

#[test]
fn test_commit_applies_without_waiting() {
    let (adapter, _logger, handle) = mount_batched(RenderTree::from("now"));
    assert_eq!(adapter.html(), "");

    handle.commit();
    assert_eq!(adapter.html(), "now");
}

#[test]
fn test_unmount_inside_window_leaves_nothing() {
    let (adapter, _logger, handle) = mount_batched(list(&["a", "b"]));
    handle.unmount();

    assert_eq!(adapter.html(), "");
    assert!(adapter
        .structural_ops()
        .iter()
        .all(|op| parent_of(op) != Some(adapter.root())));
}
