//! Batching of task runs into task groups
//!
//! [`TaskGroupCollector`] buffers collected tasks and flushes them as one
//! [`TaskGroup`] whenever the buffer reaches the configured group size. A
//! single mutex guards the buffer, the closed flag and the flush itself, so
//! the append, the size check and the swap to a fresh buffer happen as one
//! step: under concurrent producers every task is submitted exactly once and
//! no group ever exceeds the configured size.

use crate::executor::Executor;
use crate::launcher::GroupLauncher;
use crate::task::{Submission, TaskGroup, TaskRun};
use crate::workdir::WorkDirAllocator;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use weft_core::{combine, Result};

#[derive(Debug, Default)]
struct CollectorState {
    buffer: Vec<TaskRun>,
    closed: bool,
}

/// Groups task runs before handing them to an executor
pub struct TaskGroupCollector<E: Executor + ?Sized> {
    executor: Arc<E>,
    group_size: NonZeroUsize,
    state: Mutex<CollectorState>,
}

impl<E: Executor + ?Sized> TaskGroupCollector<E> {
    pub fn new(executor: Arc<E>, group_size: NonZeroUsize) -> Self {
        Self {
            executor,
            group_size,
            state: Mutex::new(CollectorState::default()),
        }
    }

    pub fn group_size(&self) -> usize {
        self.group_size.get()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Tasks waiting for their group to fill up
    pub fn pending(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Add a task to the current group, flushing the group once it is full
    ///
    /// After [`close`](Self::close) the task bypasses grouping and is
    /// submitted on its own. Flush errors (work directory creation, launcher
    /// staging, submission) propagate to the caller; the tasks of a failed
    /// group are not submitted.
    pub fn collect(&self, task: TaskRun) -> Result<()> {
        let mut state = self.state.lock();

        if state.closed {
            tracing::debug!(task = %task.name, "collector closed, submitting task individually");
            return self.executor.submit(Submission::Task(task));
        }

        state.buffer.push(task);
        if state.buffer.len() == self.group_size.get() {
            let members = std::mem::take(&mut state.buffer);
            self.submit_group(members)?;
        }

        Ok(())
    }

    /// Flush a partial group, if any, and switch to individual submission
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }

        state.closed = true;
        let members = std::mem::take(&mut state.buffer);
        if members.is_empty() {
            return Ok(());
        }

        tracing::debug!(tasks = members.len(), "flushing partial task group on close");
        self.submit_group(members)
    }

    fn submit_group(&self, members: Vec<TaskRun>) -> Result<()> {
        let fingerprint = combine(members.iter().map(|task| &task.fingerprint));
        let work_dir = WorkDirAllocator::allocate(self.executor.work_dir(), &fingerprint)?;
        let script = GroupLauncher::new(&members).render()?;
        let group = TaskGroup::new(members, fingerprint, work_dir, script)?;

        // Every member launcher must exist before the group script can run
        for member in group.members() {
            self.executor.launcher_preparer(member).prepare()?;
        }

        tracing::info!(
            group = %group.name(),
            tasks = group.len(),
            fingerprint = %fingerprint,
            work_dir = %group.work_dir().display(),
            "submitting task group"
        );
        self.executor.submit(Submission::Group(group))
    }
}
