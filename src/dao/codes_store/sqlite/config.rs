use std::path::{Path, PathBuf};

const IN_MEMORY_PATH: &str = ":memory:";

/// Runtime configuration describing where the SQLite database lives.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
}

impl SqliteConfig {
    /// Store the database at `path`, creating parent directories on open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Volatile database that lives as long as the store handle.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    pub(super) fn is_in_memory(&self) -> bool {
        self.path == Path::new(IN_MEMORY_PATH)
    }
}
