//! Default locations for weft state

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the weft home directory
pub const WEFT_HOME_VAR: &str = "WEFT_HOME";

/// Directory name used under the launch directory when no override is set
pub const DEFAULT_HOME_DIR: &str = ".weft";

/// Resolve the weft home directory
///
/// `$WEFT_HOME` wins when set and non-empty, otherwise `<cwd>/.weft`.
pub fn default_home() -> PathBuf {
    home_from(env::var_os(WEFT_HOME_VAR).map(PathBuf::from))
}

fn home_from(override_dir: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => env::current_dir()
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "current directory unavailable, using '.'");
                PathBuf::from(".")
            })
            .join(DEFAULT_HOME_DIR),
    }
}
