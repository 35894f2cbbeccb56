//! Bounded worker pool with fail-fast fan-out.
//!
//! Each stage hands the pool a slice of independent work items. Results come
//! back in input order, which keeps the merged output deterministic for a fixed
//! input set no matter how tasks were scheduled. Workers never share mutable
//! state: each task returns its own value and the caller merges them.

use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// What happened to one work item of a fail-fast fan-out.
#[derive(Debug)]
pub enum TaskOutcome<R, E> {
    /// The task ran and succeeded
    Completed(R),
    /// The task ran and failed
    Failed(E),
    /// The task was never started because an earlier failure stopped dispatch
    NotStarted,
}

impl<R, E> TaskOutcome<R, E> {
    /// Whether the task body ran (and so may have left side effects behind)
    #[must_use]
    pub const fn was_started(&self) -> bool {
        !matches!(self, Self::NotStarted)
    }
}

/// Fixed-size pool of worker threads shared by all stages of a run.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Start a pool with `workers` threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns the rayon build error if the threads cannot be spawned.
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("xmlreports-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` over every item, stopping dispatch after the first failure.
    ///
    /// Tasks already running when a failure is observed finish normally; tasks
    /// not yet started come back as [`TaskOutcome::NotStarted`]. The returned
    /// vector is index-aligned with `items`.
    pub fn fan_out<I, R, E, F>(&self, items: &[I], task: F) -> Vec<TaskOutcome<R, E>>
    where
        I: Sync,
        R: Send,
        E: Send,
        F: Fn(&I) -> Result<R, E> + Sync + Send,
    {
        let should_stop = AtomicBool::new(false);

        let outcomes: Vec<TaskOutcome<R, E>> = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if should_stop.load(Ordering::SeqCst) {
                        return TaskOutcome::NotStarted;
                    }
                    match task(item) {
                        Ok(value) => TaskOutcome::Completed(value),
                        Err(err) => {
                            should_stop.store(true, Ordering::SeqCst);
                            TaskOutcome::Failed(err)
                        }
                    }
                })
                .collect()
        });

        if should_stop.load(Ordering::SeqCst) {
            let skipped = outcomes.iter().filter(|o| !o.was_started()).count();
            debug!("Stopped dispatch after failure, {skipped} of {} tasks not started", items.len());
        }
        outcomes
    }

    /// Run `task` over every item with no early exit. Index-aligned with `items`.
    pub fn map_all<I, R, F>(&self, items: &[I], task: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&I) -> R + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(task).collect())
    }
}

/// Collapse fan-out outcomes into all results or the first failure.
///
/// "First" is the failed task with the lowest input index, so the reported
/// error is stable for a fixed input set.
///
/// # Errors
///
/// Returns the first [`TaskOutcome::Failed`] error in input order.
pub fn first_failure<R, E>(outcomes: Vec<TaskOutcome<R, E>>) -> Result<Vec<R>, E> {
    let mut results = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome {
            TaskOutcome::Completed(value) => results.push(value),
            TaskOutcome::Failed(err) => return Err(err),
            // only produced after some task failed
            TaskOutcome::NotStarted => {}
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fan_out_preserves_input_order() {
        let pool = WorkerPool::new(4).unwrap();
        let items: Vec<u32> = (0..200).collect();

        let outcomes = pool.fan_out(&items, |n| Ok::<_, String>(n * 2));
        let doubled = first_failure(outcomes).unwrap();

        assert_eq!(doubled, (0..200).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_fan_out_reports_lowest_index_failure() {
        let pool = WorkerPool::new(4).unwrap();
        let items: Vec<u32> = (0..50).collect();

        let outcomes = pool.fan_out(&items, |n| if n % 10 == 7 { Err(*n) } else { Ok(*n) });

        // Whichever failure was observed first, later items may have been
        // skipped; the lowest failing index that ran is reported.
        let failed: Vec<u32> = outcomes
            .iter()
            .filter_map(|o| match o {
                TaskOutcome::Failed(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert!(!failed.is_empty());
        assert_eq!(first_failure(outcomes).unwrap_err(), failed[0]);
    }

    #[test]
    fn test_fan_out_stops_dispatch_after_failure() {
        let pool = WorkerPool::new(1).unwrap();
        let items: Vec<u32> = (0..100).collect();
        let started = AtomicUsize::new(0);

        let outcomes = pool.fan_out(&items, |n| {
            started.fetch_add(1, Ordering::SeqCst);
            if *n == 0 {
                Err("boom")
            } else {
                Ok(())
            }
        });

        // A single worker walks the items in order, so nothing after the
        // failing item is dispatched.
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(matches!(outcomes[0], TaskOutcome::Failed("boom")));
        assert!(outcomes[1..].iter().all(|o| !o.was_started()));
    }

    #[test]
    fn test_map_all_runs_everything() {
        let pool = WorkerPool::new(3).unwrap();
        let items: Vec<u32> = (0..10).collect();

        let results = pool.map_all(&items, |n| n + 1);

        assert_eq!(results, (1..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_workers_means_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.workers(), 1);
    }
}
