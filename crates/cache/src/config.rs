//! Cache configuration

use crate::history::HistoryFile;
use crate::store::CacheDbOpener;
use std::env;
use std::path::{Path, PathBuf};
use weft_utils::{default_home, WEFT_HOME_VAR};

/// Where the weft home directory came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `<cwd>/.weft`
    Default,
    /// Environment variable override
    EnvironmentVariable(String),
    /// Set explicitly by the caller
    Explicit,
}

/// Locations of the cache stores and the run history
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// weft home directory holding `cache/` and `history`
    pub base_dir: PathBuf,
    /// Configuration source for debugging
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let source = match env::var_os(WEFT_HOME_VAR) {
            Some(value) if !value.is_empty() => {
                ConfigSource::EnvironmentVariable(WEFT_HOME_VAR.to_string())
            }
            _ => ConfigSource::Default,
        };
        Self {
            base_dir: default_home(),
            source,
        }
    }
}

impl CacheConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            source: ConfigSource::Explicit,
        }
    }

    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Directory holding one sub-directory per session store
    pub fn cache_dir(&self) -> PathBuf {
        self.base_dir.join("cache")
    }

    /// Path of the run history log
    pub fn history_file(&self) -> PathBuf {
        self.base_dir.join("history")
    }

    pub fn history(&self) -> HistoryFile {
        HistoryFile::new(self.history_file())
    }

    pub fn store_opener(&self) -> CacheDbOpener {
        CacheDbOpener::new(self.cache_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Builder for creating cache configurations
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    base_dir: Option<PathBuf>,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the weft home directory
    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn build(self) -> CacheConfig {
        match self.base_dir {
            Some(base_dir) => CacheConfig::new(base_dir),
            None => CacheConfig::default(),
        }
    }
}
