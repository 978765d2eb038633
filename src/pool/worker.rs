use super::Pool;
use super::ring::{Phase, Wait};
use super::task::{Task, TaskContext, TaskResult};
use crossbeam::channel::{Sender, select};
use std::time::Instant;

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The input channel was closed and empty.
    Drained,
    Stopped,
    TimedOut(Phase),
}

/// One member of the ring. Runs read, execute, write until it exits.
pub(crate) struct Worker<'p, A, V> {
    id: usize,
    pool: &'p Pool<A, V>,
    results: Sender<TaskResult<V>>,
}

impl<'p, A, V> Worker<'p, A, V> {
    pub(crate) fn new(id: usize, pool: &'p Pool<A, V>, results: Sender<TaskResult<V>>) -> Self {
        Self { id, pool, results }
    }

    pub(crate) fn run(self) {
        let deadline = Instant::now() + self.pool.timeout;
        let context = TaskContext::new(self.pool.name.clone(), self.id);

        log::debug!("pool {} worker {} started", self.pool.name, self.id);

        match self.work(&context, deadline) {
            Exit::Drained => {
                log::debug!("pool {} worker {} drained input", self.pool.name, self.id)
            }
            Exit::Stopped => {
                log::debug!("pool {} worker {} stopped", self.pool.name, self.id)
            }
            Exit::TimedOut(phase) => log::error!(
                "pool {} worker {} exceeded its {:?} deadline during {:?}",
                self.pool.name,
                self.id,
                self.pool.timeout,
                phase
            ),
        }
    }

    fn work(&self, context: &TaskContext, deadline: Instant) -> Exit {
        loop {
            let task = match self.read(deadline) {
                Ok(task) => task,
                Err(exit) => return exit,
            };

            let result = task.execute(context);

            if let Err(exit) = self.write(result, deadline) {
                return exit;
            }
        }
    }

    fn read(&self, deadline: Instant) -> Result<Task<A, V>, Exit> {
        match self.pool.ring.wait(self.id, Phase::Read, deadline) {
            Wait::Ready => {}
            Wait::Stopped => return Err(Exit::Stopped),
            Wait::TimedOut => return Err(Exit::TimedOut(Phase::Read)),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let received = select! {
            recv(self.pool.tasks_rx) -> msg => msg,
            recv(self.pool.ring.stop_receiver(self.id)) -> _ => return Err(Exit::Stopped),
            default(remaining) => return Err(Exit::TimedOut(Phase::Read)),
        };

        // Hand the read token on before executing, so the successor's read
        // overlaps this worker's execution. On a closed input this also lets
        // the successor observe the closure.
        self.pool.ring.pass(Phase::Read, self.id);

        received.map_err(|_| Exit::Drained)
    }

    fn write(&self, result: TaskResult<V>, deadline: Instant) -> Result<(), Exit> {
        match self.pool.ring.wait(self.id, Phase::Write, deadline) {
            Wait::Ready => {}
            Wait::Stopped => {
                self.dropped(&result.descriptor.id);
                return Err(Exit::Stopped);
            }
            Wait::TimedOut => return Err(Exit::TimedOut(Phase::Write)),
        }

        // The push itself can block on a full output channel, so stop must
        // be observable here too.
        let task_id = result.descriptor.id.clone();
        let remaining = deadline.saturating_duration_since(Instant::now());
        select! {
            send(self.results, result) -> sent => match sent {
                Ok(()) => {
                    self.pool.ring.pass(Phase::Write, self.id);
                    Ok(())
                }
                Err(_) => Err(Exit::Stopped),
            },
            recv(self.pool.ring.stop_receiver(self.id)) -> _ => {
                self.dropped(&task_id);
                Err(Exit::Stopped)
            }
            default(remaining) => Err(Exit::TimedOut(Phase::Write)),
        }
    }

    fn dropped(&self, task_id: &str) {
        log::warn!(
            "pool {} worker {} dropping result of task {} after stop",
            self.pool.name,
            self.id,
            task_id
        );
    }
}
