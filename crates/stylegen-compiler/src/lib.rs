//! Stylegen Compiler Library
//!
//! Stylesheet compiler backends behind a narrow capability interface.
//!
//! # Modules
//!
//! - [`builtin`] - In-process SCSS/Sass compilation
//! - [`external`] - Command-line compilers run as a subprocess
//! - [`project`] - Compiler project file parsing
//! - [`error`] - Error taxonomy shared by all backends

pub mod builtin;
pub mod error;
pub mod external;
pub mod project;

use std::path::{Path, PathBuf};

pub use builtin::GrassCompiler;
pub use error::{CompileError, ErrorKind, Result};
pub use external::ExternalCompiler;
pub use project::{OutputStyle, ProjectConfig};

/// Trait for stylesheet compilers.
///
/// `source_root` is the directory holding the project file; `project_file`
/// is relative to it. Implementations resolve every other path against
/// `source_root` and must not depend on the process working directory.
pub trait StylesheetCompiler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run the `compile` action once.
    fn compile(&self, source_root: &Path, project_file: &Path) -> Result<OutputManifest>;
}

/// Files a compiler reports having written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputManifest {
    files: Vec<PathBuf>,
}

impl OutputManifest {
    /// Create a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written file.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    /// All written files, in the order they were recorded.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<C: StylesheetCompiler + ?Sized> StylesheetCompiler for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compile(&self, source_root: &Path, project_file: &Path) -> Result<OutputManifest> {
        (**self).compile(source_root, project_file)
    }
}
