//! Launcher scripts written into task and group work directories

mod group;
mod task;

pub use group::GroupLauncher;
pub use task::TaskLauncher;

use std::path::Path;
use weft_core::{Error, Result};

/// Quote a path for safe interpolation into a bash script
pub(crate) fn quote_path(path: &Path) -> Result<String> {
    let raw = path.to_str().ok_or_else(|| {
        Error::configuration(format!(
            "work directory is not valid UTF-8: {}",
            path.display()
        ))
    })?;
    shlex::try_quote(raw)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| Error::configuration(format!("cannot quote '{raw}' for the launcher: {e}")))
}
