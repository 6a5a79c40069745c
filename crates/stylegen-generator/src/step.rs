//! The stylesheet compile step.
//!
//! Runs once per site build: resolves the source root next to the hook's
//! install directory, locates the compiler project file there, and invokes
//! the compiler rooted at that directory. Compiler errors propagate
//! unchanged.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use stylegen_compiler::{
    CompileError, ExternalCompiler, GrassCompiler, OutputManifest, StylesheetCompiler,
};
use stylegen_core::{
    Backend, CoreError, Isolation, PROJECT_FILE_CANDIDATES, SiteContext, StylesheetConfig,
    find_project_file, layout,
};
use tracing::{debug, info};

use crate::workdir::{self, WorkingDirGuard};

/// Result type for compile step operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// What a single run did.
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// Resolved source root.
    pub source_root: PathBuf,

    /// Project file used, relative to the source root.
    pub project_file: PathBuf,

    /// Files the compiler reported writing.
    pub manifest: OutputManifest,

    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

/// Build-pipeline hook that compiles the site's stylesheets.
pub struct CompileStep {
    install_dir: PathBuf,
    source_dir: String,
    project_file: Option<PathBuf>,
    isolation: Isolation,
    compiler: Box<dyn StylesheetCompiler>,
}

impl fmt::Debug for CompileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileStep")
            .field("install_dir", &self.install_dir)
            .field("source_dir", &self.source_dir)
            .field("project_file", &self.project_file)
            .field("isolation", &self.isolation)
            .field("compiler", &self.compiler.name())
            .finish()
    }
}

impl CompileStep {
    /// Create a step for a hook installed in `install_dir`, compiling the
    /// sibling directory `source_dir` with `compiler`.
    #[must_use]
    pub fn new(
        install_dir: impl Into<PathBuf>,
        source_dir: impl Into<String>,
        compiler: impl StylesheetCompiler + 'static,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            source_dir: source_dir.into(),
            project_file: None,
            isolation: Isolation::default(),
            compiler: Box::new(compiler),
        }
    }

    /// Create a step from the `[stylesheets]` configuration section.
    #[must_use]
    pub fn from_config(config: &StylesheetConfig) -> Self {
        let compiler: Box<dyn StylesheetCompiler> = match config.backend {
            Backend::Grass => Box::new(GrassCompiler::new().quiet(config.quiet)),
            Backend::External => {
                let mut external =
                    ExternalCompiler::new(&config.command).with_args(config.args.clone());
                if let Some(secs) = config.timeout_secs {
                    external = external.with_timeout(Duration::from_secs(secs));
                }
                Box::new(external)
            }
        };

        Self {
            install_dir: config.install_dir.clone(),
            source_dir: config.source_dir.clone(),
            project_file: config.project_file.clone(),
            isolation: config.isolation,
            compiler,
        }
    }

    /// Use this project file instead of discovering one.
    #[must_use]
    pub fn with_project_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.project_file = Some(name.into());
        self
    }

    /// Set how the source root is handed to the compiler.
    #[must_use]
    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// The compiler backend name.
    #[must_use]
    pub fn compiler_name(&self) -> &str {
        self.compiler.name()
    }

    /// Resolve the source root for `site` as an absolute path. Recomputed on
    /// every call.
    ///
    /// A relative site root is anchored at the working directory outside any
    /// active [`WorkingDirGuard`] scope.
    pub fn source_root(&self, site: &SiteContext) -> Result<PathBuf> {
        let site_root = workdir::absolute(&site.root)?;
        layout::source_root(&site_root, &self.install_dir, &self.source_dir).map_err(|e| match e {
            CoreError::Layout { path, message } => {
                CompileError::filesystem(path, io::Error::new(io::ErrorKind::InvalidInput, message))
            }
            other => CompileError::filesystem(&site_root, io::Error::other(other.to_string())),
        })
    }

    /// Locate the project file inside `source_root`.
    pub fn project_file(&self, source_root: &Path) -> Result<PathBuf> {
        find_project_file(source_root, self.project_file.as_deref()).ok_or_else(|| {
            let message = match &self.project_file {
                Some(name) => format!("project file `{}` not found", name.display()),
                None => format!(
                    "no project file found (looked for {})",
                    PROJECT_FILE_CANDIDATES.join(", ")
                ),
            };
            CompileError::config(source_root, message)
        })
    }

    /// The host hook: compile the stylesheets once.
    ///
    /// Produces no value; outputs land wherever the compiler's project file
    /// says and are not verified here.
    pub fn generate(&self, site: &SiteContext) -> Result<()> {
        self.run(site).map(drop)
    }

    /// Compile the stylesheets once and report what happened.
    pub fn run(&self, site: &SiteContext) -> Result<CompileReport> {
        let start = Instant::now();

        let source_root = self.source_root(site)?;
        if !source_root.is_dir() {
            return Err(CompileError::missing_dir(&source_root));
        }
        let project_file = self.project_file(&source_root)?;

        info!(
            compiler = self.compiler.name(),
            source_root = %source_root.display(),
            project_file = %project_file.display(),
            isolation = ?self.isolation,
            "compiling stylesheets"
        );

        let manifest = match self.isolation {
            Isolation::Explicit => self.compiler.compile(&source_root, &project_file)?,
            Isolation::Ambient => {
                let manifest = {
                    let _cwd = WorkingDirGuard::enter(&source_root)?;
                    self.compiler.compile(Path::new("."), &project_file)?
                };
                rebase(manifest, &source_root)
            }
        };

        let report = CompileReport {
            source_root,
            project_file,
            manifest,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        debug!(files = ?report.manifest.files(), "compiler output");
        info!(
            files = report.manifest.len(),
            duration_ms = report.duration_ms,
            "stylesheet step complete"
        );

        Ok(report)
    }
}

/// Make manifest paths reported relative to the scoped working directory
/// relative to the caller's instead.
fn rebase(manifest: OutputManifest, source_root: &Path) -> OutputManifest {
    let mut rebased = OutputManifest::new();
    for file in manifest.files() {
        if file.is_relative() {
            rebased.push(source_root.join(file.strip_prefix(".").unwrap_or(file)));
        } else {
            rebased.push(file.clone());
        }
    }
    rebased
}
