//! Integration tests for task grouping and submission

use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use weft_core::{combine, Error, Fingerprint, Result, TaskHasher, TASK_LAUNCHER_FILE};
use weft_task::{
    Executor, LauncherPreparer, ProcessConfig, Submission, TaskGroupCollector, TaskId,
    TaskLauncher, TaskRun, WorkDirAllocator,
};

/// Executor double that records every submission
struct RecordingExecutor {
    root: PathBuf,
    stage_launchers: bool,
    fail_prepare_for: Option<TaskId>,
    submissions: Mutex<Vec<Submission>>,
}

impl RecordingExecutor {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            stage_launchers: true,
            fail_prepare_for: None,
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn without_staging(root: &Path) -> Self {
        Self {
            stage_launchers: false,
            ..Self::new(root)
        }
    }

    fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }
}

struct NoopPreparer;

impl LauncherPreparer for NoopPreparer {
    fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

struct FailingPreparer;

impl LauncherPreparer for FailingPreparer {
    fn prepare(&self) -> Result<()> {
        Err(Error::submission("task", "launcher staging failed"))
    }
}

impl Executor for RecordingExecutor {
    fn work_dir(&self) -> &Path {
        &self.root
    }

    fn launcher_preparer<'a>(&'a self, task: &'a TaskRun) -> Box<dyn LauncherPreparer + 'a> {
        if self.fail_prepare_for == Some(task.id) {
            Box::new(FailingPreparer)
        } else if self.stage_launchers {
            Box::new(TaskLauncher::new(task))
        } else {
            Box::new(NoopPreparer)
        }
    }

    fn submit(&self, submission: Submission) -> Result<()> {
        if self.stage_launchers {
            for member in submission.children().unwrap_or_default() {
                assert!(
                    member.work_dir.join(TASK_LAUNCHER_FILE).exists(),
                    "member launcher must be staged before the group is submitted"
                );
            }
        }
        self.submissions.lock().push(submission);
        Ok(())
    }
}

fn task(root: &Path, id: u64) -> TaskRun {
    let process = Arc::new(ProcessConfig::new("align"));
    let script = format!("echo task-{id}");
    let mut hasher = TaskHasher::new();
    hasher.update_str(&process.name).update_str(&script);
    let fingerprint = hasher.finish();
    let work_dir = WorkDirAllocator::path_for(&root.join("tasks"), &fingerprint);
    TaskRun::new(TaskId::new(id), id as usize, process, script, fingerprint, work_dir)
}

fn group_size(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap()
}

fn member_ids(submission: &Submission) -> Vec<u64> {
    match submission.children() {
        Some(members) => members.iter().map(|t| t.id.get()).collect(),
        None => vec![submission.id().get()],
    }
}

#[test]
fn test_five_tasks_in_groups_of_three() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(3));

    let tasks: Vec<TaskRun> = (1..=5).map(|id| task(root.path(), id)).collect();
    for t in &tasks {
        collector.collect(t.clone()).unwrap();
    }
    assert_eq!(executor.submissions().len(), 1);
    assert_eq!(collector.pending(), 2);

    collector.close().unwrap();

    let submissions = executor.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(member_ids(&submissions[0]), vec![1, 2, 3]);
    assert_eq!(member_ids(&submissions[1]), vec![4, 5]);

    let expected: Vec<Fingerprint> = tasks[..3].iter().map(|t| t.fingerprint).collect();
    assert_eq!(submissions[0].fingerprint(), combine(&expected));
    assert_eq!(
        submissions[0].work_dir(),
        WorkDirAllocator::path_for(root.path(), &combine(&expected))
    );
    assert!(submissions[0].work_dir().is_dir());

    let Submission::Group(second) = &submissions[1] else {
        panic!("expected a task group");
    };
    let d = second.script().find(tasks[3].work_dir.to_str().unwrap()).unwrap();
    let e = second.script().find(tasks[4].work_dir.to_str().unwrap()).unwrap();
    assert!(d < e);
}

#[test]
fn test_collect_after_close_submits_individually() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(4));

    collector.close().unwrap();
    assert!(collector.is_closed());
    assert!(executor.submissions().is_empty());

    collector.collect(task(root.path(), 9)).unwrap();

    let submissions = executor.submissions();
    assert_eq!(submissions.len(), 1);
    assert!(matches!(&submissions[0], Submission::Task(t) if t.id == TaskId::new(9)));
    assert_eq!(collector.pending(), 0);
}

#[test]
fn test_close_is_idempotent() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(3));

    collector.collect(task(root.path(), 1)).unwrap();
    collector.close().unwrap();
    collector.close().unwrap();

    assert_eq!(executor.submissions().len(), 1);
}

#[test]
fn test_full_group_on_close_is_not_resubmitted() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(2));

    collector.collect(task(root.path(), 1)).unwrap();
    collector.collect(task(root.path(), 2)).unwrap();
    collector.close().unwrap();

    assert_eq!(executor.submissions().len(), 1);
}

#[test]
fn test_huge_group_size_buffers_lazily() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(usize::MAX / 2));

    for id in 1..=3 {
        collector.collect(task(root.path(), id)).unwrap();
    }
    assert!(executor.submissions().is_empty());
    assert_eq!(collector.pending(), 3);

    collector.close().unwrap();

    let submissions = executor.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(member_ids(&submissions[0]), vec![1, 2, 3]);
}

#[test]
fn test_preparation_failure_aborts_whole_group() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor {
        fail_prepare_for: Some(TaskId::new(2)),
        ..RecordingExecutor::new(root.path())
    });
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(3));

    collector.collect(task(root.path(), 1)).unwrap();
    collector.collect(task(root.path(), 2)).unwrap();
    let err = collector.collect(task(root.path(), 3)).unwrap_err();

    assert!(matches!(err, Error::Submission { .. }));
    assert!(executor.submissions().is_empty());
}

#[test]
fn test_work_dir_failure_propagates_from_close() {
    let root = TempDir::new().unwrap();
    let bogus_root = root.path().join("not-a-dir");
    fs::write(&bogus_root, b"file").unwrap();
    let executor = Arc::new(RecordingExecutor::without_staging(&bogus_root));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(3));

    collector.collect(task(root.path(), 1)).unwrap();
    let err = collector.close().unwrap_err();

    assert!(matches!(err, Error::FileSystem { .. }));
    assert!(executor.submissions().is_empty());
    assert!(collector.is_closed());
}

#[test]
fn test_concurrent_producers_submit_each_task_once() {
    let root = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::without_staging(root.path()));
    let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(7));

    std::thread::scope(|scope| {
        for producer in 0..8u64 {
            let collector = &collector;
            let root = root.path();
            scope.spawn(move || {
                for n in 0..50u64 {
                    collector.collect(task(root, producer * 1000 + n)).unwrap();
                }
            });
        }
    });
    collector.close().unwrap();

    let submissions = executor.submissions();
    let sizes: Vec<usize> = submissions.iter().map(Submission::task_count).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 400);
    assert_eq!(submissions.len(), 400usize.div_ceil(7));
    assert!(sizes[..sizes.len() - 1].iter().all(|&n| n == 7));
    assert_eq!(sizes[sizes.len() - 1], 400 % 7);

    let unique: HashSet<u64> = submissions.iter().flat_map(member_ids).collect();
    assert_eq!(unique.len(), 400);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_group_counts_follow_group_size(len in 0usize..40, size in 1usize..9) {
        let root = TempDir::new().unwrap();
        let executor = Arc::new(RecordingExecutor::without_staging(root.path()));
        let collector = TaskGroupCollector::new(Arc::clone(&executor), group_size(size));

        for id in 0..len as u64 {
            collector.collect(task(root.path(), id)).unwrap();
        }
        collector.close().unwrap();

        let submissions = executor.submissions();
        prop_assert_eq!(submissions.len(), len.div_ceil(size));

        let sizes: Vec<usize> = submissions.iter().map(Submission::task_count).collect();
        prop_assert_eq!(sizes.iter().sum::<usize>(), len);
        if let Some((last, full)) = sizes.split_last() {
            prop_assert!(full.iter().all(|&n| n == size));
            let expected_last = if len % size == 0 { size } else { len % size };
            prop_assert_eq!(*last, expected_last);
        }

        let ids: Vec<u64> = submissions.iter().flat_map(member_ids).collect();
        prop_assert_eq!(ids, (0..len as u64).collect::<Vec<_>>());
    }
}
