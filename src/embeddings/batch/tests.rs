use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

fn fast_policy(group_size: usize) -> BatchPolicy {
    BatchPolicy {
        group_size,
        group_delay: Duration::from_millis(1),
    }
}

#[test]
fn default_policy() {
    let policy = BatchPolicy::default();
    assert_eq!(policy.group_size, 5);
    assert_eq!(policy.group_delay, Duration::from_secs(1));
}

#[tokio::test]
async fn preserves_input_order() {
    let items: Vec<usize> = (0..13).collect();
    let results = run_grouped(items, &fast_policy(5), |item| Ok(item * 2))
        .await
        .expect("run_grouped should succeed");

    let expected: Vec<usize> = (0..13).map(|i| i * 2).collect();
    assert_eq!(results, expected);
}

#[tokio::test]
async fn empty_input() {
    let results = run_grouped(Vec::<usize>::new(), &fast_policy(5), Ok)
        .await
        .expect("empty input should succeed");
    assert!(results.is_empty());
}

#[tokio::test]
async fn single_failure_aborts_whole_batch() {
    let items: Vec<usize> = (0..7).collect();
    let result = run_grouped(items, &fast_policy(5), |item| {
        if item == 3 {
            Err(crate::RagError::EmbeddingFailed {
                text: item.to_string(),
                reason: "boom".to_string(),
            })
        } else {
            Ok(item)
        }
    })
    .await;

    assert!(matches!(
        result,
        Err(crate::RagError::EmbeddingFailed { .. })
    ));
}

#[tokio::test]
async fn dispatches_every_item_exactly_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let items: Vec<usize> = (0..11).collect();

    let op_counter = Arc::clone(&counter);
    let results = run_grouped(items, &fast_policy(4), move |item| {
        op_counter.fetch_add(1, Ordering::SeqCst);
        Ok(item)
    })
    .await
    .expect("run_grouped should succeed");

    assert_eq!(results.len(), 11);
    assert_eq!(counter.load(Ordering::SeqCst), 11);
}

#[tokio::test]
async fn zero_group_size_is_clamped() {
    let policy = BatchPolicy {
        group_size: 0,
        group_delay: Duration::from_millis(1),
    };

    let results = run_grouped(vec![1usize, 2, 3], &policy, Ok)
        .await
        .expect("clamped group size should succeed");
    assert_eq!(results, vec![1, 2, 3]);
}
