#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::anyhow;
use futures::future::try_join_all;
use tracing::debug;

use crate::{RagError, Result};

/// Rate policy for grouped provider calls: how many requests may be in
/// flight at once, and how long to pause between successive groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPolicy {
    pub group_size: usize,
    pub group_delay: Duration,
}

impl Default for BatchPolicy {
    #[inline]
    fn default() -> Self {
        Self {
            group_size: 5,
            group_delay: Duration::from_secs(1),
        }
    }
}

/// Run `op` over `items` in groups under the given policy.
///
/// All items within a group are dispatched concurrently on blocking worker
/// threads; groups run strictly in order with `group_delay` between them
/// (no delay after the final group). Results come back indexed by input
/// position, never by arrival order. The call is all-or-nothing: the first
/// failing item aborts it with that item's error and no partial result.
#[inline]
pub async fn run_grouped<T, R, F>(items: Vec<T>, policy: &BatchPolicy, op: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Clone + Send + 'static,
{
    let group_size = policy.group_size.max(1);
    let group_count = items.len().div_ceil(group_size);
    let mut results = Vec::with_capacity(items.len());
    let mut remaining = items.into_iter();

    for group_index in 0..group_count {
        let group: Vec<T> = remaining.by_ref().take(group_size).collect();
        debug!(
            "Dispatching group {}/{} ({} items)",
            group_index + 1,
            group_count,
            group.len()
        );

        let handles: Vec<_> = group
            .into_iter()
            .map(|item| {
                let op = op.clone();
                tokio::task::spawn_blocking(move || op(item))
            })
            .collect();

        let joined = try_join_all(handles)
            .await
            .map_err(|e| RagError::Other(anyhow!("Batch worker panicked: {e}")))?;
        for result in joined {
            results.push(result?);
        }

        if group_index + 1 < group_count {
            debug!("Pausing {:?} before next group", policy.group_delay);
            tokio::time::sleep(policy.group_delay).await;
        }
    }

    Ok(results)
}
