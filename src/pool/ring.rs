//! Token-passing ring that serializes channel reads and writes across workers.
//!
//! Each worker owns three depth-1 signals: stop, input-ready and output-ready.
//! Holding the input token grants the right to take the next task off the
//! shared input channel; holding the output token grants the right to push the
//! next result. Both tokens travel `i -> (i + 1) % n`, so reads and writes
//! happen in the same fixed worker order.

use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded, select};
use parking_lot::Mutex;
use std::time::Instant;

/// Which serialization point a worker is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Read,
    Write,
}

/// Outcome of waiting for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    Ready,
    Stopped,
    TimedOut,
}

/// Binary signal: firing an already-fired signal is a no-op.
struct Signal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Signal {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    fn fire(&self) {
        // Full means the token is already pending.
        let _ = self.tx.try_send(());
    }
}

/// Stop signal. Stopping sends once and then closes the channel, so every
/// later receive returns immediately.
struct StopSignal {
    tx: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

impl StopSignal {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    fn stop(&self) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.try_send(());
        }
    }

    fn is_stopped(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}

struct WorkerSignals {
    stop: StopSignal,
    input_ready: Signal,
    output_ready: Signal,
}

impl WorkerSignals {
    fn new() -> Self {
        Self {
            stop: StopSignal::new(),
            input_ready: Signal::new(),
            output_ready: Signal::new(),
        }
    }

    fn token(&self, phase: Phase) -> &Signal {
        match phase {
            Phase::Read => &self.input_ready,
            Phase::Write => &self.output_ready,
        }
    }
}

pub(crate) struct Ring {
    workers: Vec<WorkerSignals>,
}

impl Ring {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            workers: (0..size).map(|_| WorkerSignals::new()).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn next(&self, worker: usize) -> usize {
        (worker + 1) % self.workers.len()
    }

    /// Hand both tokens to worker 0.
    pub(crate) fn prime(&self) {
        if let Some(first) = self.workers.first() {
            first.input_ready.fire();
            first.output_ready.fire();
        }
    }

    /// Forward the `phase` token from `worker` to its successor.
    pub(crate) fn pass(&self, phase: Phase, worker: usize) {
        self.workers[self.next(worker)].token(phase).fire();
    }

    pub(crate) fn stop_all(&self) {
        for signals in &self.workers {
            signals.stop.stop();
        }
    }

    pub(crate) fn stop_receiver(&self, worker: usize) -> &Receiver<()> {
        &self.workers[worker].stop.rx
    }

    /// Block until `worker` holds the `phase` token, is stopped, or `deadline` passes.
    ///
    /// Stop is checked first so a stopped worker never takes another token.
    pub(crate) fn wait(&self, worker: usize, phase: Phase, deadline: Instant) -> Wait {
        let signals = &self.workers[worker];
        if signals.stop.is_stopped() {
            return Wait::Stopped;
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let token = &signals.token(phase).rx;
        select! {
            recv(signals.stop.rx) -> _ => Wait::Stopped,
            recv(token) -> _ => Wait::Ready,
            default(remaining) => Wait::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(20)
    }

    #[test]
    fn test_prime_gives_worker_zero_both_tokens() {
        let ring = Ring::new(3);
        ring.prime();
        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::Ready);
        assert_eq!(ring.wait(0, Phase::Write, soon()), Wait::Ready);
        assert_eq!(ring.wait(1, Phase::Read, soon()), Wait::TimedOut);
    }

    #[test]
    fn test_tokens_travel_around_the_ring() {
        let ring = Ring::new(3);
        ring.pass(Phase::Read, 2);
        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::Ready);

        ring.pass(Phase::Write, 0);
        assert_eq!(ring.wait(1, Phase::Write, soon()), Wait::Ready);
        assert_eq!(ring.wait(1, Phase::Read, soon()), Wait::TimedOut);
    }

    #[test]
    fn test_signal_is_binary() {
        let ring = Ring::new(1);
        ring.prime();
        ring.prime();
        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::Ready);
        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::TimedOut);
    }

    #[test]
    fn test_stop_wins_and_is_sticky() {
        let ring = Ring::new(2);
        ring.prime();
        ring.stop_all();
        ring.stop_all();

        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::Stopped);
        assert_eq!(ring.wait(0, Phase::Read, soon()), Wait::Stopped);
        assert_eq!(ring.wait(1, Phase::Write, soon()), Wait::Stopped);
    }

    #[test]
    fn test_single_worker_ring_points_at_itself() {
        let ring = Ring::new(1);
        assert_eq!(ring.next(0), 0);
        ring.pass(Phase::Write, 0);
        assert_eq!(ring.wait(0, Phase::Write, soon()), Wait::Ready);
    }
}
