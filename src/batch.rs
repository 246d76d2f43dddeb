//! Batch runner: a pausable, resumable, abortable sequential task runner
//! with automatic backpressure on rate-limit errors.
//!
//! Tasks are processed strictly in order, one at a time. Control flows
//! through an explicit `watch` command channel instead of shared mutable
//! flags; observers read a consistent `BatchSnapshot` behind a lock.
//! The runner is the only writer of run state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::provider::{ContentGenerator, GenerationRequest};
use crate::types::{BatchResult, BatchTask, RunState};

/// Runner tuning knobs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Fixed wake interval for the pause-wait loop. Abort is re-checked
    /// on every wake.
    pub poll_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Control command observed by the runner at the top of each iteration
/// and while parked in the pause-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Pause,
    Abort,
}

/// Consistent, copyable view of a run for the reporting layer.
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    pub state: RunState,
    /// Number of tasks fully resolved (success or permanent failure).
    pub current: usize,
    /// Task count at run start.
    pub total: usize,
    pub results: Vec<BatchResult>,
    /// User-facing rate-limit notice; cleared on resume.
    pub notice: Option<String>,
}

impl BatchSnapshot {
    fn idle(total: usize) -> Self {
        Self {
            state: RunState::Idle,
            current: 0,
            total,
            results: Vec::new(),
            notice: None,
        }
    }
}

/// Control handle for a running batch. Cloneable; commands issued after
/// an abort have no effect.
#[derive(Clone)]
pub struct BatchController {
    tx: watch::Sender<Command>,
}

impl BatchController {
    /// Suspend before the next task starts. A task already in flight
    /// completes first.
    pub fn pause(&self) {
        let _ = self.tx.send(Command::Pause);
    }

    /// Resume a paused run and clear any rate-limit notice.
    pub fn resume(&self) {
        let _ = self.tx.send(Command::Run);
    }

    /// Halt processing permanently. Not reversible within a run.
    pub fn abort(&self) {
        let _ = self.tx.send(Command::Abort);
    }
}

/// Read-only observer handle.
#[derive(Clone)]
pub struct BatchHandle {
    shared: Arc<RwLock<BatchSnapshot>>,
}

impl BatchHandle {
    pub fn snapshot(&self) -> BatchSnapshot {
        self.shared.read().clone()
    }
}

/// Drives a `ContentGenerator` over an ordered task list.
pub struct BatchRunner {
    generator: Arc<dyn ContentGenerator>,
    tasks: Vec<BatchTask>,
    config: BatchConfig,
    shared: Arc<RwLock<BatchSnapshot>>,
    control: watch::Receiver<Command>,
}

impl BatchRunner {
    /// Build a runner and its controller. The run starts when `run` is
    /// awaited; until then the state is `Idle`.
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        tasks: Vec<BatchTask>,
        config: BatchConfig,
    ) -> (Self, BatchController) {
        let (tx, rx) = watch::channel(Command::Run);
        let shared = Arc::new(RwLock::new(BatchSnapshot::idle(tasks.len())));
        (
            Self {
                generator,
                tasks,
                config,
                shared,
                control: rx,
            },
            BatchController { tx },
        )
    }

    pub fn handle(&self) -> BatchHandle {
        BatchHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Process every task in order until completion or abort, and return
    /// the final snapshot.
    pub async fn run(mut self) -> BatchSnapshot {
        let total = self.tasks.len();
        {
            let mut shared = self.shared.write();
            shared.state = RunState::Running;
            shared.current = 0;
            shared.total = total;
            shared.results.clear();
            shared.notice = None;
        }
        info!(total, "batch run started");

        let mut cursor = 0usize;
        let mut aborted = false;

        while cursor < total {
            debug!(current = cursor, total, "batch progress");
            self.shared.write().current = cursor;

            // Copy the command out so the watch::Ref guard drops before
            // the pause arm borrows the runner again.
            let command = *self.control.borrow_and_update();
            match command {
                Command::Abort => {
                    aborted = true;
                    break;
                }
                Command::Pause => {
                    if !self.wait_while_paused().await {
                        aborted = true;
                        break;
                    }
                }
                Command::Run => {}
            }

            let task = self.tasks[cursor].clone();
            let request = GenerationRequest {
                country: task.country.clone(),
                hotel_name: task.hotel_name.clone(),
                city: task.city.clone(),
                external_id: None,
                source_urls: Vec::new(),
            };

            match self.generator.generate(&request).await {
                Ok(record) => {
                    debug!(hotel = %task.hotel_name, "task succeeded");
                    let mut shared = self.shared.write();
                    shared.results.push(BatchResult::success(task, record));
                    cursor += 1;
                    shared.current = cursor;
                }
                Err(err) if err.is_rate_limit() => {
                    // Backpressure: self-pause without advancing the
                    // cursor; the same task is retried after resume.
                    warn!(hotel = %task.hotel_name, error = %err, "rate limited, pausing batch");
                    self.shared.write().notice = Some(err.to_string());
                    if !self.wait_while_paused().await {
                        aborted = true;
                        break;
                    }
                }
                Err(err) => {
                    warn!(hotel = %task.hotel_name, error = %err, "task failed");
                    let mut shared = self.shared.write();
                    shared
                        .results
                        .push(BatchResult::failure(task, err.to_string()));
                    cursor += 1;
                    shared.current = cursor;
                }
            }
        }

        {
            let mut shared = self.shared.write();
            shared.current = cursor;
            shared.state = if aborted {
                RunState::Aborted
            } else {
                RunState::Completed
            };
        }
        let snapshot = self.shared.read().clone();
        info!(
            state = snapshot.state.as_str(),
            resolved = snapshot.current,
            total = snapshot.total,
            "batch run finished"
        );
        snapshot
    }

    /// Park until a command issued after the pause engaged resumes the
    /// run. Returns false when the run must abort (explicit abort, or the
    /// controller is gone and the pause could never be lifted).
    async fn wait_while_paused(&mut self) -> bool {
        // A command issued while the last task was in flight is still
        // unseen here. An abort must win before the pause engages; a
        // pending pause or a resume raced against the pause trigger is
        // consumed, leaving the watermark clean so that only commands
        // issued after `Paused` is published lift the pause.
        match self.control.has_changed() {
            Ok(true) => {
                if *self.control.borrow_and_update() == Command::Abort {
                    return false;
                }
            }
            Ok(false) => {}
            Err(_) => return false,
        }
        self.shared.write().state = RunState::Paused;
        debug!("batch paused");
        loop {
            sleep(self.config.poll_interval).await;
            match self.control.has_changed() {
                Ok(true) => match *self.control.borrow_and_update() {
                    Command::Abort => return false,
                    Command::Run => break,
                    Command::Pause => continue,
                },
                Ok(false) => continue,
                // Controller dropped while paused: nothing can ever
                // lift the pause, treat as abort.
                Err(_) => return false,
            }
        }

        let mut shared = self.shared.write();
        shared.state = RunState::Running;
        shared.notice = None;
        debug!("batch resumed");
        true
    }
}
