// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Worker pool and pending-task bookkeeping for `async`/`await`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use indexmap::IndexMap;
use tl_ast::{ExecutionResult, Pos, VarId};

use crate::RuntimeDiagnostic;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What a finished task sends back to its awaiter.
pub(crate) type TaskResult = Result<ExecutionResult, RuntimeDiagnostic>;

/// A lazily grown pool of worker threads sharing one job queue.
///
/// A job is only queued once a worker is known to be free for it, so a task
/// that awaits a nested task can never starve it.
pub struct WorkerPool {
    sender: Mutex<Sender<Job>>,
    receiver: Arc<Mutex<Receiver<Job>>>,
    idle: Arc<AtomicUsize>,
    spawned: AtomicUsize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        Self {
            sender: Mutex::new(sender),
            receiver: Arc::new(Mutex::new(receiver)),
            idle: Arc::new(AtomicUsize::new(0)),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Number of worker threads started so far.
    pub fn size(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub(crate) fn execute(&self, job: Job) {
        let reserved = self.idle.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if !reserved && !self.spawn_worker() {
            tracing::warn!("could not start a worker thread, running task inline");
            job();
            return;
        }
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(mpsc::SendError(job)) = sender.send(job) {
            drop(sender);
            job();
        }
    }

    fn spawn_worker(&self) -> bool {
        let receiver = Arc::clone(&self.receiver);
        let idle = Arc::clone(&self.idle);
        let index = self.spawned.fetch_add(1, Ordering::SeqCst);
        let spawned = thread::Builder::new().name(format!("tl-worker-{}", index)).spawn(move || loop {
            let job = {
                let receiver = receiver.lock().unwrap_or_else(PoisonError::into_inner);
                receiver.recv()
            };
            match job {
                Ok(job) => {
                    job();
                    idle.fetch_add(1, Ordering::SeqCst);
                }
                Err(_) => break,
            }
        });
        match spawned {
            Ok(_) => {
                tracing::debug!(worker = index, "started async worker");
                true
            }
            Err(err) => {
                self.spawned.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!(error = %err, "failed to spawn async worker");
                false
            }
        }
    }
}

/// A started task whose result has not been awaited yet.
#[derive(Debug)]
pub(crate) struct PendingTask {
    pub function: String,
    pub pos: Pos,
    pub receiver: Receiver<TaskResult>,
}

impl PendingTask {
    pub fn channel(function: String, pos: Pos) -> (SyncSender<TaskResult>, Self) {
        let (sender, receiver) = mpsc::sync_channel(1);
        (sender, Self { function, pos, receiver })
    }
}

/// A task that was started but never awaited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakedTask {
    pub target: String,
    pub function: String,
    pub pos: Pos,
}

/// Pending tasks keyed by target variable, in start order.
///
/// Global targets share the evaluator's set; a function-local target lives
/// in the set of the frame that started it.
#[derive(Debug, Default)]
pub(crate) struct PendingTasks {
    pending: IndexMap<VarId, PendingTask>,
    leaked: Vec<LeakedTask>,
}

impl PendingTasks {
    /// Register a task. A task already pending on the same target is leaked.
    pub fn insert(&mut self, target: VarId, target_name: &str, task: PendingTask) {
        if let Some(previous) = self.pending.insert(target, task) {
            tracing::warn!(target = target_name, function = %previous.function, "async target reassigned before await");
            self.leaked.push(LeakedTask { target: target_name.to_string(), function: previous.function, pos: previous.pos });
        }
    }

    pub fn remove(&mut self, target: VarId) -> Option<PendingTask> {
        self.pending.shift_remove(&target)
    }

    /// Record tasks leaked elsewhere, e.g. by a frame that returned before awaiting.
    pub fn extend_leaked(&mut self, leaked: Vec<LeakedTask>) {
        self.leaked.extend(leaked);
    }

    /// Everything never awaited, in start order. Leaves the set empty.
    pub fn drain_leaks(&mut self, name_of: impl Fn(VarId) -> String) -> Vec<LeakedTask> {
        let mut leaked = std::mem::take(&mut self.leaked);
        leaked.extend(self.pending.drain(..).map(|(target, task)| LeakedTask {
            target: name_of(target),
            function: task.function,
            pos: task.pos,
        }));
        leaked
    }
}
