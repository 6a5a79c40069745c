//! Compiler error taxonomy.

use std::{
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Duration,
};

use thiserror::Error;

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while running a stylesheet compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The project file is missing, unparsable, or holds an invalid value.
    #[error("configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A stylesheet failed to compile.
    #[error("compilation error in {path}: {message}")]
    Compilation { path: PathBuf, message: String },

    /// A directory or file could not be read or written.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The external compiler could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external compiler could not be waited on after it started.
    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external compiler ran and reported failure. `output` holds its
    /// stderr followed by its stdout, whichever were non-empty.
    #[error("`{program}` exited with {status}: {output}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        output: String,
    },

    /// The external compiler did not finish in time.
    #[error("`{program}` timed out after {after:?}")]
    Timeout { program: String, after: Duration },
}

/// Coarse error category, for hosts that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Compilation,
    Filesystem,
    Tool,
    Timeout,
}

impl CompileError {
    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compilation error.
    pub fn compilation(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Compilation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Filesystem error for a directory that should exist but does not.
    pub fn missing_dir(path: &Path) -> Self {
        Self::filesystem(
            path,
            io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
        )
    }

    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Compilation { .. } => ErrorKind::Compilation,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Spawn { .. } | Self::Wait { .. } | Self::ToolFailed { .. } => ErrorKind::Tool,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CompileError::config("_sass/config.rb", "line 3: expected `key = value`");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("_sass/config.rb"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_dir_is_filesystem() {
        let err = CompileError::missing_dir(Path::new("/site/_sass"));
        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert!(err.to_string().contains("/site/_sass"));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_timeout_display() {
        let err = CompileError::Timeout {
            program: "compass".to_string(),
            after: Duration::from_secs(2),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.to_string(), "`compass` timed out after 2s");
    }

    #[test]
    fn test_wait_error_is_not_a_spawn_failure() {
        let err = CompileError::Wait {
            program: "compass".to_string(),
            source: io::Error::other("interrupted"),
        };
        assert_eq!(err.kind(), ErrorKind::Tool);
        assert!(err.to_string().starts_with("failed waiting for `compass`"));
        assert!(!err.to_string().contains("failed to start"));
    }
}
