//! Barrier batching: bounded-concurrency execution in consecutive groups.
//!
//! Jobs are partitioned into consecutive groups of at most `limit` and
//! each group runs concurrently, but the whole group must finish before
//! the next group starts. This is a barrier, not a sliding window:
//! throughput within a group is bounded by its slowest job, which keeps
//! the scheduling trivially predictable at the cost of some parallelism.
//! That trade-off is deliberate and covered by tests, so do not "fix" it
//! into a sliding-window pool without changing the documented contract.
//!
//! Results are concatenated in submission order; completion order within
//! a group is unspecified.

use futures_util::future;

/// Runs `jobs` in consecutive barrier batches of at most `limit`.
///
/// A `limit` of zero is treated as one. Returns the job results in
/// submission order.
pub async fn run_batched<T, F>(jobs: Vec<F>, limit: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let limit = limit.max(1);
    let mut results = Vec::with_capacity(jobs.len());
    let mut iter = jobs.into_iter();

    loop {
        let group: Vec<F> = iter.by_ref().take(limit).collect();
        if group.is_empty() {
            break;
        }
        // join_all preserves submission order within the group
        results.extend(future::join_all(group).await);
    }

    results
}
