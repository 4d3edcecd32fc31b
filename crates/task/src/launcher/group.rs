//! Bash launcher running every member of a task group in sequence

use super::quote_path;
use crate::task::TaskRun;
use weft_core::{Result, DEFAULT_SHELL, TASK_LAUNCHER_FILE, TASK_LOG_FILE};

/// Renders the script a task group runs in its own work directory
///
/// Members run one after another in submission order: the script changes into
/// each member's work directory and runs that member's launcher there, sending
/// combined output to the member's log file.
pub struct GroupLauncher<'a> {
    members: &'a [TaskRun],
}

impl<'a> GroupLauncher<'a> {
    pub fn new(members: &'a [TaskRun]) -> Self {
        Self { members }
    }

    pub fn render(&self) -> Result<String> {
        let mut dirs = String::new();
        for member in self.members {
            dirs.push_str("    ");
            dirs.push_str(&quote_path(&member.work_dir)?);
            dirs.push('\n');
        }

        Ok(format!(
            "#!{DEFAULT_SHELL}\n\
             # weft task group: {count} tasks\n\
             array=(\n\
             {dirs})\n\
             for task_dir in \"${{array[@]}}\"; do\n    \
             cd \"$task_dir\" || continue\n    \
             {DEFAULT_SHELL} {TASK_LAUNCHER_FILE} > {TASK_LOG_FILE} 2>&1\n\
             done\n",
            count = self.members.len(),
        ))
    }
}
