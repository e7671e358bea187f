//! Generational task queue shared by ingestion and the worker pool.
//!
//! Tasks are plain data: what changed, the generation that produced it, and
//! the epoch it belongs to. The queue tracks every task from the moment it
//! is pushed until a worker finishes it, so `outstanding` and `depth` cover
//! both waiting and in-flight work and only reach zero once the engine has
//! fully settled.
//!
//! A reset bumps the epoch and forgets every outstanding task. Workers that
//! still hold a task from the old epoch see the mismatch and drop it, and
//! their `finish` calls are ignored.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::QueueError;
use crate::id::{ChainId, OrthoId, SentenceId, TokenId};

/// Result type for queue operations.
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// What a task has to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Derive pairs and chains from a new sentence.
    Sentence(SentenceId),
    /// Search for orthotopes completed by a new pair direction.
    Pair { from: TokenId, to: TokenId },
    /// Search for orthotopes supported by a new chain.
    Chain(ChainId),
    /// Search for orthotopes grown from a new orthotope.
    Ortho(OrthoId),
}

/// A unit of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    /// 1 for tasks created by ingestion, parent + 1 for follow-ups.
    pub generation: u32,
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Task>,
    /// Outstanding (pending + in flight) tasks per generation.
    generations: BTreeMap<u32, usize>,
    outstanding: usize,
    epoch: u64,
    shut_down: bool,
}

impl QueueState {
    fn push(&mut self, task: Task) {
        *self.generations.entry(task.generation).or_default() += 1;
        self.outstanding += 1;
        self.pending.push_back(task);
    }
}

/// FIFO of tasks with settlement tracking and a drained signal.
#[derive(Debug)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    /// Signalled when work is pushed or the queue shuts down.
    work: Condvar,
    /// Signalled when the outstanding count reaches zero.
    idle: Condvar,
    max_pending: usize,
}

impl TaskQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            work: Condvar::new(),
            idle: Condvar::new(),
            max_pending,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("task queue lock poisoned")
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Refuse new ingestion while the backlog is at its limit.
    pub fn check_capacity(&self) -> QueueResult<()> {
        let state = self.lock();
        if state.shut_down {
            return Err(QueueError::ShutDown);
        }
        if state.outstanding >= self.max_pending {
            return Err(QueueError::Full {
                pending: state.outstanding,
                limit: self.max_pending,
            });
        }
        Ok(())
    }

    /// Push first-generation tasks from ingestion.
    pub fn push_roots(&self, kinds: impl IntoIterator<Item = TaskKind>) -> QueueResult<()> {
        let mut state = self.lock();
        if state.shut_down {
            return Err(QueueError::ShutDown);
        }
        let epoch = state.epoch;
        for kind in kinds {
            state.push(Task {
                kind,
                generation: 1,
                epoch,
            });
        }
        drop(state);
        self.work.notify_all();
        Ok(())
    }

    /// Push follow-ups of `parent`. Never refused; dropped only when the
    /// parent belongs to an older epoch.
    pub fn push_followups(&self, parent: &Task, kinds: impl IntoIterator<Item = TaskKind>) {
        let mut state = self.lock();
        if state.epoch != parent.epoch {
            return;
        }
        let mut pushed = false;
        for kind in kinds {
            state.push(Task {
                kind,
                generation: parent.generation + 1,
                epoch: parent.epoch,
            });
            pushed = true;
        }
        drop(state);
        if pushed {
            self.work.notify_all();
        }
    }

    /// Block until a task is available. Returns `None` after shutdown.
    ///
    /// The task stays outstanding until [`finish`](Self::finish).
    pub fn next(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if state.shut_down {
                return None;
            }
            if let Some(task) = state.pending.pop_front() {
                return Some(task);
            }
            state = self.work.wait(state).expect("task queue lock poisoned");
        }
    }

    /// Mark a task returned by [`next`](Self::next) as done.
    pub fn finish(&self, task: &Task) {
        let mut state = self.lock();
        if state.epoch != task.epoch {
            return;
        }
        if let Some(count) = state.generations.get_mut(&task.generation) {
            *count -= 1;
            if *count == 0 {
                state.generations.remove(&task.generation);
            }
        }
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.outstanding == 0 {
            self.idle.notify_all();
        }
    }

    /// Tasks waiting or in flight.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Highest generation among outstanding tasks, 0 when settled.
    pub fn depth(&self) -> u32 {
        self.lock()
            .generations
            .last_key_value()
            .map(|(&generation, _)| generation)
            .unwrap_or(0)
    }

    /// Wait until no task is outstanding. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .idle
            .wait_timeout_while(state, timeout, |s| s.outstanding > 0 && !s.shut_down)
            .expect("task queue lock poisoned");
        state.outstanding == 0
    }

    /// Forget every outstanding task and start a new epoch.
    pub fn reset(&self) -> u64 {
        let mut state = self.lock();
        state.pending.clear();
        state.generations.clear();
        state.outstanding = 0;
        state.epoch += 1;
        let epoch = state.epoch;
        drop(state);
        self.idle.notify_all();
        epoch
    }

    /// Wake every worker and make `next` return `None` from now on.
    pub fn shutdown(&self) {
        self.lock().shut_down = true;
        self.work.notify_all();
        self.idle.notify_all();
    }
}
