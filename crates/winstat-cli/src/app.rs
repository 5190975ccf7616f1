//! Application state management.

use std::path::{Path, PathBuf};
use tracing::debug;
use winstat_backend_win32::Win32Query;
use winstat_core::{path, Config, Snapshot};

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// Native metadata backend
    pub query: Win32Query,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> Self {
        App {
            config,
            query: Win32Query::new(),
        }
    }

    /// Capture a snapshot of `path`, resolving relative paths first.
    pub fn snapshot(&self, path: &Path) -> anyhow::Result<Snapshot> {
        let resolved = resolve_path(path)?;
        debug!(input = %path.display(), resolved = %resolved.display(), "Resolved path");
        Ok(self.query.stat(&resolved)?)
    }
}

/// Make `input` absolute against the working directory.
///
/// Paths that already carry a root (`C:\`, `\\server\share`, `\\?\`) and
/// bare device names such as `NUL` are returned unchanged.
pub fn resolve_path(input: &Path) -> anyhow::Result<PathBuf> {
    let text = input.to_string_lossy();

    if path::root_of(&text).is_some() || text.starts_with(['\\', '/']) {
        return Ok(input.to_path_buf());
    }

    if path::is_reserved_device(&text) && !text.contains(['\\', '/']) {
        return Ok(input.to_path_buf());
    }

    Ok(std::env::current_dir()?.join(input))
}
