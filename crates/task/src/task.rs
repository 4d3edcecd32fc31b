//! Task and task group records handed to executors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use weft_core::{Error, Fingerprint, Result};

/// Unique identity of a task run within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The process a task was spawned from, shared by all of its runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Process name as declared in the pipeline
    pub name: String,
    /// Resolved directives (cpus, memory, queue, ...)
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
}

impl ProcessConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: BTreeMap::new(),
        }
    }

    /// Add a directive
    #[must_use]
    pub fn with_directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }
}

/// One unit of work with its fingerprint and work directory already resolved
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub id: TaskId,
    pub index: usize,
    pub name: String,
    /// Script executed by the task launcher
    pub script: String,
    pub fingerprint: Fingerprint,
    pub work_dir: PathBuf,
    pub process: Arc<ProcessConfig>,
}

impl TaskRun {
    pub fn new(
        id: TaskId,
        index: usize,
        process: Arc<ProcessConfig>,
        script: impl Into<String>,
        fingerprint: Fingerprint,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            index,
            name: format!("{} ({})", process.name, index),
            script: script.into(),
            fingerprint,
            work_dir: work_dir.into(),
            process,
        }
    }
}

/// A batch of task runs submitted as a single unit
///
/// Members are fixed at construction and kept in submission order; that order
/// drives both the composite fingerprint and the launcher script.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    id: TaskId,
    index: usize,
    name: String,
    fingerprint: Fingerprint,
    work_dir: PathBuf,
    process: Arc<ProcessConfig>,
    script: String,
    members: Vec<TaskRun>,
}

impl TaskGroup {
    /// Build a group, inheriting identity and process from the first member
    pub fn new(
        members: Vec<TaskRun>,
        fingerprint: Fingerprint,
        work_dir: PathBuf,
        script: String,
    ) -> Result<Self> {
        let first = members
            .first()
            .ok_or_else(|| Error::submission("task group", "a task group needs at least one member"))?;

        Ok(Self {
            id: first.id,
            index: first.index,
            name: first.name.clone(),
            process: Arc::clone(&first.process),
            fingerprint,
            work_dir,
            script,
            members,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn process(&self) -> &ProcessConfig {
        &self.process
    }

    /// The generated launcher script running every member in order
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn members(&self) -> &[TaskRun] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// What an executor receives: a single task or a group of tasks
#[derive(Debug, Clone)]
pub enum Submission {
    Task(TaskRun),
    Group(TaskGroup),
}

impl Submission {
    pub fn id(&self) -> TaskId {
        match self {
            Submission::Task(task) => task.id,
            Submission::Group(group) => group.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Submission::Task(task) => &task.name,
            Submission::Group(group) => group.name(),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Submission::Task(task) => task.fingerprint,
            Submission::Group(group) => group.fingerprint(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        match self {
            Submission::Task(task) => &task.work_dir,
            Submission::Group(group) => group.work_dir(),
        }
    }

    pub fn process(&self) -> &ProcessConfig {
        match self {
            Submission::Task(task) => &task.process,
            Submission::Group(group) => group.process(),
        }
    }

    /// Member tasks, `None` for an individual task
    pub fn children(&self) -> Option<&[TaskRun]> {
        match self {
            Submission::Task(_) => None,
            Submission::Group(group) => Some(group.members()),
        }
    }

    /// Number of task runs carried by this submission
    pub fn task_count(&self) -> usize {
        self.children().map_or(1, <[TaskRun]>::len)
    }
}
