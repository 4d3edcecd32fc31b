//! The executor seam: where grouped and individual tasks leave this crate

use crate::launcher::TaskLauncher;
use crate::task::{Submission, TaskRun};
use std::path::Path;
use weft_core::Result;

/// Stages the per-task launcher files into a task's work directory
pub trait LauncherPreparer {
    fn prepare(&self) -> Result<()>;
}

/// Backend that dispatches tasks to compute resources
///
/// Implementations own scheduling, retries and timeouts. `submit` accepts both
/// individual tasks and groups so a backend can treat them uniformly through
/// [`Submission`].
pub trait Executor: Send + Sync {
    /// Root under which group work directories are allocated
    fn work_dir(&self) -> &Path;

    /// Preparer staging `task`'s launcher; defaults to the bash [`TaskLauncher`]
    fn launcher_preparer<'a>(&'a self, task: &'a TaskRun) -> Box<dyn LauncherPreparer + 'a> {
        Box::new(TaskLauncher::new(task))
    }

    /// Hand a task or group over for dispatch
    fn submit(&self, submission: Submission) -> Result<()>;
}
