//! Property tests for the children differ and keyed list reconciliation.

use std::time::Duration;

use proptest::prelude::*;
use spark_reconcile::adapter::testing::RecordingAdapter;
use spark_reconcile::{diff_children, element, longest_increasing_subsequence, mount, RenderOptions, RenderTree};

const KEYS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

fn keys() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len()).prop_shuffle()
}

fn list(keys: &[&str]) -> RenderTree {
    element("list", "ul")
        .children(keys.iter().map(|key| element("item", "li").key(*key).child(*key)))
        .into()
}

fn html(keys: &[&str]) -> String {
    let items: String = keys.iter().map(|key| format!("<li>{key}</li>")).collect();
    format!("<ul>{items}</ul>")
}

/// Quadratic reference for the subsequence length.
fn lis_length(seq: &[usize]) -> usize {
    let mut best = vec![1; seq.len()];
    for i in 0..seq.len() {
        for j in 0..i {
            if seq[j] < seq[i] {
                best[i] = best[i].max(best[j] + 1);
            }
        }
    }
    best.into_iter().max().unwrap_or(0)
}

/// Replays a diff the way the children reconciler does: drop removed
/// entries, then place every moved or added entry right after its
/// predecessor in the next order.
fn replay(prev: &[&'static str], next: &[&'static str]) -> Vec<&'static str> {
    let diff = diff_children(prev, next);
    let mut order: Vec<&'static str> = prev.iter().filter(|key| !diff.removed.contains(*key)).copied().collect();
    for (index, key) in next.iter().enumerate() {
        if !diff.added.contains(key) && !diff.moved.contains(key) {
            continue;
        }
        order.retain(|existing| existing != key);
        let at = match index {
            0 => 0,
            _ => order.iter().position(|existing| *existing == next[index - 1]).unwrap() + 1,
        };
        order.insert(at, *key);
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_lis_is_increasing_and_longest(seq in prop::collection::vec(0usize..32, 0..24)) {
        let picked = longest_increasing_subsequence(&seq);
        prop_assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(picked.windows(2).all(|pair| seq[pair[0]] < seq[pair[1]]));
        prop_assert_eq!(picked.len(), lis_length(&seq));
    }

    #[test]
    fn test_replayed_diff_reaches_next_order(prev in keys(), next in keys()) {
        prop_assert_eq!(replay(&prev, &next), next.clone());

        let diff = diff_children(&prev, &next);
        let kept = next.iter().filter(|key| prev.contains(*key)).count();
        let stable: Vec<usize> = next
            .iter()
            .filter_map(|key| prev.iter().position(|p| p == key))
            .collect();
        prop_assert_eq!(diff.moved.len(), kept - lis_length(&stable));
    }

    #[test]
    fn test_keyed_updates_match_target(steps in prop::collection::vec(keys(), 1..6)) {
        let adapter = RecordingAdapter::new();
        let handle = mount(list(&[]), adapter.root(), adapter.clone(), RenderOptions::new().unbatched()).unwrap();

        for step in &steps {
            handle.update(list(step)).unwrap();
            prop_assert_eq!(adapter.html(), html(step));
        }
    }

    #[test]
    fn test_batched_updates_commit_last_render(
        initial in keys(),
        steps in prop::collection::vec(keys(), 1..6),
    ) {
        let window = Duration::from_millis(10);
        let adapter = RecordingAdapter::new();
        let handle = mount(list(&initial), adapter.root(), adapter.clone(), RenderOptions::new()).unwrap();
        handle.advance(window).unwrap();
        prop_assert_eq!(adapter.html(), html(&initial));
        adapter.take_ops();

        for step in &steps {
            handle.update(list(step)).unwrap();
        }
        prop_assert!(adapter.structural_ops().is_empty());

        handle.advance(window).unwrap();
        prop_assert_eq!(adapter.html(), html(steps.last().unwrap()));
    }
}
