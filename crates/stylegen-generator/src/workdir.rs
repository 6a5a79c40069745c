//! Scoped process working directory.
//!
//! The working directory is process-wide. [`WorkingDirGuard`] changes it
//! under a process-wide lock and puts the previous value back when dropped,
//! on every exit path. [`absolute`] resolves relative paths against the
//! directory outside any scope, so code running concurrently with a scope
//! never observes the scoped directory.

use std::{
    env,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use stylegen_compiler::CompileError;
use tracing::{debug, error};

/// Serialises every scoped change of the working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Working directory in effect outside the active scope, if one is active.
/// Held while the process working directory is read or changed.
static BASE_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

fn base_dir() -> MutexGuard<'static, Option<PathBuf>> {
    BASE_DIR.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Make `path` absolute against the working directory outside any scope.
///
/// Does not wait for an active [`WorkingDirGuard`].
pub fn absolute(path: &Path) -> Result<PathBuf, CompileError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let base = base_dir();
    let resolved = match base.as_deref() {
        Some(dir) => std::path::absolute(dir.join(path)),
        None => std::path::absolute(path),
    };
    resolved.map_err(|e| CompileError::filesystem(path, e))
}

/// Holds the working directory at a target until dropped.
#[derive(Debug)]
pub struct WorkingDirGuard {
    previous: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDirGuard {
    /// Change the working directory to `dir`.
    ///
    /// Blocks while another guard is alive. On failure nothing is changed.
    pub fn enter(dir: &Path) -> Result<Self, CompileError> {
        // A panic inside another scope leaves nothing to repair: its guard
        // already restored the directory during unwinding.
        let lock = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let mut base = base_dir();
        let previous = env::current_dir().map_err(|e| CompileError::filesystem(".", e))?;
        env::set_current_dir(dir).map_err(|e| CompileError::filesystem(dir, e))?;
        *base = Some(previous.clone());
        debug!(from = %previous.display(), to = %dir.display(), "entered working directory");

        Ok(Self {
            previous,
            _lock: lock,
        })
    }

    /// The directory restored on drop.
    #[must_use]
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let mut base = base_dir();
        match env::set_current_dir(&self.previous) {
            Ok(()) => debug!(to = %self.previous.display(), "restored working directory"),
            Err(e) => error!(
                to = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            ),
        }
        *base = None;
    }
}
