//! Fixed-size worker pool whose results come out in submission order.
//!
//! Workers share one input channel and one output channel. A token ring
//! (see [`ring`]) fixes the order in which workers read from the input and
//! write to the output, so even though tasks execute in parallel, result `i`
//! on the output channel always belongs to task `i` of the input.
//!
//! ```rust
//! use geopool::pool::{Pool, Task, TaskDescriptor};
//! use std::thread;
//!
//! let pool: Pool<u64, u64> = Pool::new(3, 5, "squares")?;
//! let tasks: Vec<_> = (0..5)
//!     .map(|i| Task::new(TaskDescriptor::new("square").with_id(i.to_string()), i, |_, x| Ok(x * x)))
//!     .collect();
//!
//! let results = pool.results();
//! thread::scope(|s| {
//!     s.spawn(|| pool.run());
//!     s.spawn(|| pool.generate_from(tasks));
//! });
//!
//! let squares: Vec<u64> = results.iter().filter_map(|r| r.into_value()).collect();
//! assert_eq!(squares, vec![0, 1, 4, 9, 16]);
//! # Ok::<(), geopool::GeopoolError>(())
//! ```

mod ring;
mod task;
mod worker;

pub use task::{ExecFn, Task, TaskContext, TaskDescriptor, TaskResult};

use crate::config::PoolConfig;
use crate::error::{GeopoolError, Result};
use crossbeam::channel::{Receiver, SendTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use ring::Ring;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use worker::Worker;

/// How long `generate_from` waits on a full input channel before checking
/// whether the pool has halted.
const GENERATE_RECHECK: Duration = Duration::from_millis(10);

/// Ring-synchronized worker pool over tasks taking `A` and producing `V`.
pub struct Pool<A, V> {
    name: Arc<str>,
    timeout: Duration,
    ring: Ring,
    tasks_tx: Mutex<Option<Sender<Task<A, V>>>>,
    tasks_rx: Receiver<Task<A, V>>,
    results_tx: Mutex<Option<Sender<TaskResult<V>>>>,
    results_rx: Receiver<TaskResult<V>>,
    halted: AtomicBool,
}

impl<A, V> Pool<A, V>
where
    A: Send,
    V: Send,
{
    /// Create a pool with the default 20 second worker deadline.
    pub fn new(worker_count: usize, task_count: usize, name: impl Into<String>) -> Result<Self> {
        Self::with_timeout(worker_count, task_count, name, PoolConfig::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        worker_count: usize,
        task_count: usize,
        name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::from_config(&PoolConfig::new(name, worker_count, task_count).with_timeout(timeout))
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        config.validate().map_err(GeopoolError::InvalidConfig)?;

        let (tasks_tx, tasks_rx) = bounded(config.task_count);
        let (results_tx, results_rx) = bounded(config.task_count);

        Ok(Self {
            name: Arc::from(config.name.as_str()),
            timeout: config.timeout(),
            ring: Ring::new(config.worker_count),
            tasks_tx: Mutex::new(Some(tasks_tx)),
            tasks_rx,
            results_tx: Mutex::new(Some(results_tx)),
            results_rx,
            halted: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn worker_count(&self) -> usize {
        self.ring.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Receiver side of the output channel.
    ///
    /// The channel disconnects once [`run`](Self::run) returns. Drain it until
    /// then rather than counting results: a stop or a worker timeout can leave
    /// fewer results than tasks.
    pub fn results(&self) -> Receiver<TaskResult<V>> {
        self.results_rx.clone()
    }

    /// Run the workers and block until every one of them has exited.
    ///
    /// Returns an error if called a second time; the output channel is closed
    /// after the first run.
    pub fn run(&self) -> Result<()> {
        let results = self.results_tx.lock().take().ok_or_else(|| {
            GeopoolError::InvalidConfig(format!("pool {} has already run", self.name))
        })?;

        log::debug!(
            "pool {} starting {} workers (deadline {:?})",
            self.name,
            self.ring.len(),
            self.timeout
        );

        self.ring.prime();

        let spawned = thread::scope(|scope| -> Result<()> {
            for id in 0..self.ring.len() {
                let worker = Worker::new(id, self, results.clone());
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", self.name, id))
                    .spawn_scoped(scope, move || worker.run());

                if let Err(e) = spawned {
                    log::error!("pool {} failed to spawn worker {}: {}", self.name, id, e);
                    self.stop_workers();
                    return Err(e.into());
                }
            }
            Ok(())
        });

        // Dropping the last sender closes the output channel.
        drop(results);
        self.halted.store(true, Ordering::Release);

        log::debug!("pool {} finished", self.name);
        spawned
    }

    /// Push every task onto the input channel, then close it.
    ///
    /// Blocks while the input channel is full; run [`run`](Self::run)
    /// concurrently. Returns how many tasks were accepted, which is less than
    /// the number offered if the pool halts first. Calling it again after the
    /// input was closed accepts nothing.
    pub fn generate_from<I>(&self, tasks: I) -> usize
    where
        I: IntoIterator<Item = Task<A, V>>,
    {
        let Some(tx) = self.tasks_tx.lock().take() else {
            log::warn!("pool {} input channel is already closed", self.name);
            return 0;
        };

        let mut accepted = 0;
        for task in tasks {
            if !self.offer(&tx, task) {
                log::warn!(
                    "pool {} halted after accepting {} tasks",
                    self.name,
                    accepted
                );
                break;
            }
            accepted += 1;
        }
        accepted
    }

    fn offer(&self, tx: &Sender<Task<A, V>>, mut task: Task<A, V>) -> bool {
        loop {
            match tx.send_timeout(task, GENERATE_RECHECK) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(pending)) => {
                    if self.halted.load(Ordering::Acquire) {
                        return false;
                    }
                    task = pending;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    /// Signal every worker to stop at its next wait point.
    ///
    /// A task that is already executing runs to completion; its result is
    /// dropped. Calling this more than once is harmless.
    pub fn stop_workers(&self) {
        log::debug!("pool {} stopping workers", self.name);
        self.halted.store(true, Ordering::Release);
        self.ring.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    fn numbered(count: u64) -> Vec<Task<u64, u64>> {
        (0..count)
            .map(|i| {
                Task::new(
                    TaskDescriptor::new("double").with_id(i.to_string()),
                    i,
                    |_, x| Ok(x * 2),
                )
            })
            .collect()
    }

    fn drive(pool: &Pool<u64, u64>, tasks: Vec<Task<u64, u64>>) -> Vec<TaskResult<u64>> {
        let results = pool.results();
        thread::scope(|s| {
            let runner = s.spawn(|| pool.run());
            s.spawn(|| pool.generate_from(tasks));
            let collected: Vec<_> = results.iter().collect();
            runner.join().unwrap().unwrap();
            collected
        })
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Pool::<u64, u64>::new(0, 4, "empty").err().unwrap();
        assert!(matches!(err, GeopoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_results_in_submission_order() {
        let pool = Pool::new(4, 32, "order").unwrap();
        let results = drive(&pool, numbered(32));

        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.descriptor.id, i.to_string());
            assert_eq!(result.value(), Some(&(i as u64 * 2)));
        }
    }

    #[test]
    fn test_fewer_tasks_than_workers() {
        let pool = Pool::new(8, 3, "sparse").unwrap();
        let results = drive(&pool, numbered(3));
        let ids: Vec<_> = results.iter().map(|r| r.descriptor.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_no_tasks() {
        let pool = Pool::new(2, 0, "idle").unwrap();
        assert!(drive(&pool, Vec::new()).is_empty());
    }

    #[test]
    fn test_run_twice_is_an_error() {
        let pool = Pool::new(1, 1, "once").unwrap();
        drive(&pool, numbered(1));
        assert!(matches!(pool.run(), Err(GeopoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_generate_from_twice_accepts_nothing() {
        let pool: Pool<u64, u64> = Pool::new(1, 4, "closed").unwrap();
        assert_eq!(pool.generate_from(numbered(2)), 2);
        assert_eq!(pool.generate_from(numbered(2)), 0);
    }

    #[test]
    fn test_fake_tasks_flow_through() {
        let pool = Pool::new(3, 6, "fakes").unwrap();
        let tasks = (0..6).map(|_| Task::default()).collect();
        let results = drive(&pool, tasks);

        assert_eq!(results.len(), 6);
        assert!(
            results
                .iter()
                .all(|r| matches!(r.error(), Some(TaskError::FakeTask)))
        );
    }

    #[test]
    fn test_accessors() {
        let pool: Pool<(), ()> =
            Pool::with_timeout(5, 1, "meta", Duration::from_millis(300)).unwrap();
        assert_eq!(pool.name(), "meta");
        assert_eq!(pool.worker_count(), 5);
        assert_eq!(pool.timeout(), Duration::from_millis(300));
    }
}
