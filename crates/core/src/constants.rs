//! Constants shared by the launcher scripts and cache cleanup

// Files staged into every task work directory
pub const TASK_SCRIPT_FILE: &str = ".command.sh";
pub const TASK_LAUNCHER_FILE: &str = ".command.run";

// Files produced while a task runs
pub const TASK_OUTPUT_FILE: &str = ".command.out";
pub const TASK_ERROR_FILE: &str = ".command.err";
pub const TASK_LOG_FILE: &str = ".command.log";
pub const TASK_EXIT_FILE: &str = ".exitcode";

// Any file starting with this prefix is a launcher or log artifact
pub const LAUNCHER_ARTIFACT_PREFIX: &str = ".command.";

/// Shell used to run launcher scripts
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Number of hex characters used for the work directory shard prefix
pub const WORK_DIR_SHARD_LEN: usize = 2;

/// Returns true when a file name marks a launcher, log or exit-status artifact
pub fn is_log_artifact(file_name: &str) -> bool {
    file_name.starts_with(LAUNCHER_ARTIFACT_PREFIX) || file_name == TASK_EXIT_FILE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_artifacts() {
        assert!(is_log_artifact(TASK_OUTPUT_FILE));
        assert!(is_log_artifact(TASK_ERROR_FILE));
        assert!(is_log_artifact(TASK_LOG_FILE));
        assert!(is_log_artifact(TASK_LAUNCHER_FILE));
        assert!(is_log_artifact(TASK_EXIT_FILE));
    }

    #[test]
    fn test_regular_files_are_not_log_artifacts() {
        assert!(!is_log_artifact("output.bam"));
        assert!(!is_log_artifact("command.log"));
        assert!(!is_log_artifact(".exitcode.bak"));
    }
}
