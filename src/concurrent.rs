//! Experimental concurrent radius search.
//!
//! A fixed number of workers share one frontier of pending nodes. Each worker
//! pops a node, measures it, pushes the surviving children back and keeps its
//! matches locally until it exits, then hands them to a shared accumulator.
//!
//! The walk is bounded by a wall-clock budget. Once it is exceeded the
//! cancellation flag is raised and every worker stops before taking its next
//! node, so the result may be partial; [`ConcurrentHits::complete`] says which.
//! On small and medium trees this is slower than [`Tree::search`], the
//! coordination costs more than the distance computations it spreads out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace, warn};

use crate::config::ConcurrentSearchConfig;
use crate::errors::{TreeError, TreeResult};
use crate::metric::{Distance, MetricElement};
use crate::node::TreeNode;
use crate::search::candidates;
use crate::tree::Tree;

/// Result of [`Tree::search_concurrent`].
#[derive(Debug, Clone)]
pub struct ConcurrentHits<'a, T> {
    /// Matching elements in no particular order.
    pub matches: Vec<&'a T>,
    pub comparisons: usize,
    /// False if the time budget ran out before every candidate was visited.
    pub complete: bool,
}

impl<'a, T> ConcurrentHits<'a, T> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

struct Frontier<'a, T> {
    queue: VecDeque<&'a TreeNode<T>>,
    in_flight: usize,
}

struct Shared<'a, T> {
    frontier: Mutex<Frontier<'a, T>>,
    ready: Condvar,
    cancelled: AtomicBool,
    comparisons: AtomicUsize,
    matches: Mutex<Vec<&'a T>>,
    deadline: Instant,
}

fn lock<X>(mutex: &Mutex<X>) -> MutexGuard<'_, X> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'a, T> Shared<'a, T> {
    fn new(root: &'a TreeNode<T>, deadline: Instant) -> Self {
        Self {
            frontier: Mutex::new(Frontier {
                queue: VecDeque::from([root]),
                in_flight: 0,
            }),
            ready: Condvar::new(),
            cancelled: AtomicBool::new(false),
            comparisons: AtomicUsize::new(0),
            matches: Mutex::new(Vec::new()),
            deadline,
        }
    }

    /// Blocks until a node is available, the walk is finished or time is up.
    fn next_node(&self) -> Option<&'a TreeNode<T>> {
        let mut frontier = lock(&self.frontier);
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return None;
            }
            if frontier.queue.is_empty() && frontier.in_flight == 0 {
                return None;
            }
            let now = Instant::now();
            if now >= self.deadline {
                self.cancel();
                return None;
            }
            if let Some(node) = frontier.queue.pop_front() {
                frontier.in_flight += 1;
                return Some(node);
            }
            frontier = match self.ready.wait_timeout(frontier, self.deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Queues the children of a processed node and releases its in-flight slot.
    fn finish(&self, children: impl Iterator<Item = &'a TreeNode<T>>) {
        let mut frontier = lock(&self.frontier);
        frontier.queue.extend(children);
        frontier.in_flight -= 1;
        drop(frontier);
        self.ready.notify_all();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            warn!("concurrent search budget exhausted, returning partial result");
        }
        self.ready.notify_all();
    }

    /// Releases the slot of a node whose worker is unwinding and stops the walk.
    fn abandon(&self) {
        lock(&self.frontier).in_flight -= 1;
        self.cancelled.store(true, Ordering::Release);
        self.ready.notify_all();
        warn!("search worker panicked, stopping the remaining workers");
    }
}

/// A node taken from the frontier; dropping it unfinished gives the slot back.
struct Claim<'s, 'a, T> {
    shared: &'s Shared<'a, T>,
    pending: bool,
}

impl<'s, 'a, T> Claim<'s, 'a, T> {
    fn new(shared: &'s Shared<'a, T>) -> Self {
        Self {
            shared,
            pending: true,
        }
    }

    fn finish(mut self, children: impl Iterator<Item = &'a TreeNode<T>>) {
        self.shared.finish(children);
        self.pending = false;
    }
}

impl<T> Drop for Claim<'_, '_, T> {
    fn drop(&mut self) {
        if self.pending {
            self.shared.abandon();
        }
    }
}

fn run_worker<'a, T>(shared: &Shared<'a, T>, value: &T, radius: Distance)
where
    T: MetricElement,
{
    let mut local = Vec::new();
    while let Some(node) = shared.next_node() {
        let claim = Claim::new(shared);
        let dist = node.value().distance_to(value);
        shared.comparisons.fetch_add(1, Ordering::Relaxed);
        trace!(dist, "visited");
        if dist <= radius {
            local.push(node.value());
        }
        claim.finish(candidates(node, dist, radius));
    }
    if !local.is_empty() {
        lock(&shared.matches).extend(local);
    }
}

/// A worker pool kept across concurrent searches.
///
/// Building the threads is the expensive part of [`Tree::search_concurrent`];
/// callers issuing many queries build one pool and pass it to
/// [`Tree::search_concurrent_in`].
pub struct SearchPool {
    pool: rayon::ThreadPool,
    workers: usize,
    budget: Duration,
}

impl SearchPool {
    pub fn new(config: &ConcurrentSearchConfig) -> TreeResult<Self> {
        let workers = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bktree-search-{i}"))
            .build()
            .map_err(|e| TreeError::WorkerPool(e.to_string()))?;
        debug!(workers, "search pool built");
        Ok(Self {
            pool,
            workers,
            budget: config.budget(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl<T: MetricElement + Sync> Tree<T> {
    /// Radius search spread over a bounded worker pool built for this call.
    ///
    /// Best effort: the result is only guaranteed to equal [`Tree::search`]
    /// (up to order) when `complete` is true. All workers are joined before
    /// this returns.
    pub fn search_concurrent(
        &self,
        value: &T,
        radius: Distance,
        config: &ConcurrentSearchConfig,
    ) -> TreeResult<ConcurrentHits<'_, T>> {
        self.root().ok_or(TreeError::EmptyTree)?;
        let pool = SearchPool::new(config)?;
        self.search_concurrent_in(&pool, value, radius)
    }

    /// Same as [`Tree::search_concurrent`] on an existing pool.
    ///
    /// A panic in `distance_to` cancels the walk and is resumed here once
    /// every worker has stopped.
    #[instrument(level = "debug", skip(self, pool, value))]
    pub fn search_concurrent_in(
        &self,
        pool: &SearchPool,
        value: &T,
        radius: Distance,
    ) -> TreeResult<ConcurrentHits<'_, T>> {
        let root = self.root().ok_or(TreeError::EmptyTree)?;
        let workers = pool.workers;

        let shared = Shared::new(root, Instant::now() + pool.budget);
        pool.pool.scope(|scope| {
            let shared = &shared;
            for _ in 0..workers {
                scope.spawn(move |_| run_worker(shared, value, radius));
            }
        });

        let complete = !shared.cancelled.load(Ordering::Acquire);
        let comparisons = shared.comparisons.load(Ordering::Relaxed);
        let matches = shared
            .matches
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(matches = matches.len(), comparisons, complete, workers, "concurrent search done");
        Ok(ConcurrentHits {
            matches,
            comparisons,
            complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Point;

    fn generous(workers: usize) -> ConcurrentSearchConfig {
        ConcurrentSearchConfig::default()
            .with_workers(workers)
            .with_budget(Duration::from_secs(30))
    }

    #[test]
    fn test_single_node_tree() {
        let tree: Tree<Point> = [Point(3)].into_iter().collect();
        let hits = tree.search_concurrent(&Point(4), 1, &generous(2)).unwrap();
        assert!(hits.complete);
        assert_eq!(hits.matches, vec![&Point(3)]);
        assert_eq!(hits.comparisons, 1);
    }

    #[test]
    fn test_matches_sync_search_when_complete() {
        let tree: Tree<Point> = (0..200).map(|i| Point((i * 37) % 211)).collect();
        let sync = tree.search(&Point(100), 7).unwrap();
        let hits = tree.search_concurrent(&Point(100), 7, &generous(4)).unwrap();

        assert!(hits.complete);
        let mut got: Vec<i32> = hits.matches.iter().map(|p| p.0).collect();
        let mut want: Vec<i32> = sync.matches.iter().map(|p| p.0).collect();
        got.sort();
        want.sort();
        assert_eq!(got, want);
        assert_eq!(hits.comparisons, sync.comparisons);
    }

    #[test]
    fn test_exhausted_budget_reports_incomplete() {
        let tree: Tree<Point> = (0..50).map(Point).collect();
        let config = ConcurrentSearchConfig::default()
            .with_workers(2)
            .with_budget(Duration::ZERO);
        let hits = tree.search_concurrent(&Point(10), 3, &config).unwrap();
        assert!(!hits.complete);
        assert!(hits.is_empty());
        assert_eq!(hits.comparisons, 0);
    }

    #[test]
    fn test_pool_is_reused_across_queries() {
        let tree: Tree<Point> = (0..120).map(|i| Point((i * 13) % 127)).collect();
        let pool = SearchPool::new(&generous(3)).unwrap();
        assert_eq!(pool.workers(), 3);
        assert_eq!(pool.budget(), Duration::from_secs(30));

        for query in [0, 40, 90, 126] {
            let sync = tree.search(&Point(query), 4).unwrap();
            let hits = tree.search_concurrent_in(&pool, &Point(query), 4).unwrap();
            assert!(hits.complete);
            assert_eq!(hits.matches.len(), sync.matches.len());
            assert_eq!(hits.comparisons, sync.comparisons);
        }
    }

    #[test]
    fn test_empty_tree_is_error() {
        let tree: Tree<Point> = Tree::new();
        let err = tree.search_concurrent(&Point(0), 1, &generous(1)).unwrap_err();
        assert!(matches!(err, TreeError::EmptyTree));
    }
}
