//! Bottom-up deletion of task work directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use weft_core::is_log_artifact;

/// A path that could not be deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of deleting one tree
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub failed: Vec<FailedPath>,
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Removal {
    Removed,
    Kept,
    Failed,
}

/// Delete `root` children first, never raising
///
/// With `keep_logs`, launcher artifacts survive along with the directories
/// containing them. A failure leaves every ancestor of the failed path in
/// place; sibling entries are still processed.
pub fn delete_tree(root: &Path, keep_logs: bool) -> DeleteOutcome {
    delete_tree_with(root, keep_logs, unlink)
}

fn unlink(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

fn delete_tree_with<F>(root: &Path, keep_logs: bool, unlink: F) -> DeleteOutcome
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    let mut walk = Walk {
        keep_logs,
        unlink,
        failed: Vec::new(),
    };

    match fs::symlink_metadata(root) {
        Ok(metadata) => {
            walk.remove(root, metadata.is_dir());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => walk.fail(root, &e),
    }

    DeleteOutcome {
        failed: walk.failed,
    }
}

struct Walk<F> {
    keep_logs: bool,
    unlink: F,
    failed: Vec<FailedPath>,
}

impl<F> Walk<F>
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    fn remove(&mut self, path: &Path, is_dir: bool) -> Removal {
        if !is_dir {
            if self.keep_logs
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_log_artifact)
            {
                return Removal::Kept;
            }
            return self.unlink(path, false);
        }

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Removal::Removed,
            Err(e) => {
                self.fail(path, &e);
                return Removal::Failed;
            }
        };

        let mut kept = false;
        let mut broken = false;
        for entry in entries {
            let child = entry
                .and_then(|entry| entry.file_type().map(|file_type| (entry.path(), file_type)));
            let (child_path, file_type) = match child {
                Ok(child) => child,
                Err(e) => {
                    self.fail(path, &e);
                    broken = true;
                    continue;
                }
            };
            match self.remove(&child_path, file_type.is_dir()) {
                Removal::Removed => {}
                Removal::Kept => kept = true,
                Removal::Failed => broken = true,
            }
        }

        if broken {
            return Removal::Failed;
        }
        if kept {
            return Removal::Kept;
        }
        self.unlink(path, true)
    }

    fn unlink(&mut self, path: &Path, is_dir: bool) -> Removal {
        match (self.unlink)(path, is_dir) {
            Ok(()) => Removal::Removed,
            // Object-store mounts drop empty directory placeholders on their own
            Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Removed,
            Err(e) => {
                self.fail(path, &e);
                Removal::Failed
            }
        }
    }

    fn fail(&mut self, path: &Path, error: &io::Error) {
        tracing::warn!(path = %path.display(), error = %error, "failed to delete");
        self.failed.push(FailedPath {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("out/nested")).unwrap();
        for name in [
            ".command.sh",
            ".command.run",
            ".command.out",
            ".command.err",
            ".command.log",
            ".exitcode",
            "result.txt",
        ] {
            fs::write(root.join(name), name).unwrap();
        }
        fs::write(root.join("out/data.csv"), "a,b").unwrap();
        fs::write(root.join("out/nested/deep.bin"), [0u8; 4]).unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_delete_whole_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("ab/cdef");
        populate(&root);

        let outcome = delete_tree(&root, false);
        assert!(outcome.is_success());
        assert!(!root.exists());
        assert!(tmp.path().join("ab").exists());
    }

    #[test]
    fn test_keep_logs_leaves_only_launcher_artifacts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("work");
        populate(&root);

        let outcome = delete_tree(&root, true);
        assert!(outcome.is_success());
        assert_eq!(
            names(&root),
            vec![
                ".command.err",
                ".command.log",
                ".command.out",
                ".command.run",
                ".command.sh",
                ".exitcode",
            ]
        );
    }

    #[test]
    fn test_keep_logs_removes_directory_without_logs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("work");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/file"), "x").unwrap();

        assert!(delete_tree(&root, true).is_success());
        assert!(!root.exists());
    }

    #[test]
    fn test_missing_root_is_success() {
        let tmp = TempDir::new().unwrap();
        assert!(delete_tree(&tmp.path().join("gone"), false).is_success());
    }

    #[test]
    fn test_single_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("lone");
        fs::write(&file, "x").unwrap();

        assert!(delete_tree(&file, false).is_success());
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_target_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("keep.txt"), "x").unwrap();
        let root = tmp.path().join("work");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(delete_tree(&root, false).is_success());
        assert!(!root.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn test_failure_keeps_ancestors_and_processes_siblings() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("work");
        let nested = root.join("out/nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("stuck.bin"), "x").unwrap();
        fs::write(nested.join("loose.bin"), "x").unwrap();
        fs::create_dir_all(root.join("zsibling")).unwrap();
        fs::write(root.join("zsibling/file"), "x").unwrap();
        fs::write(root.join("afile"), "x").unwrap();

        let stuck = nested.join("stuck.bin");
        let outcome = delete_tree_with(&root, false, |path, is_dir| {
            if path == stuck {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"));
            }
            unlink(path, is_dir)
        });

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].path, stuck);
        assert_eq!(outcome.failed[0].reason, "busy");
        assert!(stuck.exists());
        assert!(!nested.join("loose.bin").exists());
        assert!(nested.is_dir());
        assert!(root.is_dir());
        assert!(!root.join("zsibling").exists());
        assert!(!root.join("afile").exists());
    }

    #[test]
    fn test_not_found_during_unlink_is_success() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("work");
        fs::create_dir_all(root.join("placeholder")).unwrap();

        let outcome = delete_tree_with(&root, false, |path, is_dir| {
            unlink(path, is_dir)?;
            if path.ends_with("placeholder") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "already gone"));
            }
            Ok(())
        });

        assert!(outcome.is_success());
        assert!(!root.exists());
    }

    #[test]
    fn test_unreadable_root_is_reported() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("afile");
        fs::write(&file, "x").unwrap();

        let outcome = delete_tree(&file.join("sub"), false);

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].path, file.join("sub"));
        assert!(file.exists());
    }
}
