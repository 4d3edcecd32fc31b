//! Default per-task launcher staging

use super::quote_path;
use crate::executor::LauncherPreparer;
use crate::task::TaskRun;
use std::path::Path;
use weft_core::{
    Error, Result, DEFAULT_SHELL, TASK_ERROR_FILE, TASK_EXIT_FILE, TASK_LAUNCHER_FILE,
    TASK_OUTPUT_FILE, TASK_SCRIPT_FILE,
};
use weft_utils::write_atomic_string;

/// Writes `.command.sh` and `.command.run` into a task's work directory
///
/// `.command.run` changes into the work directory, runs the task script with
/// stdout and stderr captured to `.command.out` / `.command.err`, and records
/// the exit status in `.exitcode`.
pub struct TaskLauncher<'a> {
    task: &'a TaskRun,
}

impl<'a> TaskLauncher<'a> {
    pub fn new(task: &'a TaskRun) -> Self {
        Self { task }
    }

    /// The task script, with a shebang added when missing
    pub fn task_script(&self) -> String {
        if self.task.script.starts_with("#!") {
            self.task.script.clone()
        } else {
            format!("#!{DEFAULT_SHELL}\n{}\n", self.task.script.trim_end())
        }
    }

    pub fn wrapper_script(&self) -> Result<String> {
        let work_dir = quote_path(&self.task.work_dir)?;
        Ok(format!(
            "#!{DEFAULT_SHELL}\n\
             # weft task launcher: {name}\n\
             cd {work_dir} || exit 1\n\
             {DEFAULT_SHELL} {TASK_SCRIPT_FILE} > {TASK_OUTPUT_FILE} 2> {TASK_ERROR_FILE}\n\
             exit_status=$?\n\
             printf '%s' \"$exit_status\" > {TASK_EXIT_FILE}\n\
             exit $exit_status\n",
            name = self.task.name.replace('\n', " "),
        ))
    }
}

impl LauncherPreparer for TaskLauncher<'_> {
    fn prepare(&self) -> Result<()> {
        let work_dir = &self.task.work_dir;
        write_atomic_string(&work_dir.join(TASK_SCRIPT_FILE), &self.task_script())?;

        let launcher = work_dir.join(TASK_LAUNCHER_FILE);
        write_atomic_string(&launcher, &self.wrapper_script()?)?;
        make_executable(&launcher)?;

        tracing::debug!(task = %self.task.name, work_dir = %work_dir.display(), "staged task launcher");
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::file_system(path, "set launcher permissions", e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
