//! Host configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for stylegen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Stylesheet build step settings.
    #[serde(default)]
    pub stylesheets: StylesheetConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root, relative to the directory holding the configuration file.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

/// Which compiler backend runs the `compile` action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process compilation.
    #[default]
    Grass,
    /// An external command-line compiler.
    External,
}

/// How the source root is handed to the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// Pass absolute paths; the process working directory is left alone.
    #[default]
    Explicit,
    /// Change the process working directory to the source root for the
    /// duration of the call, under a process-wide lock.
    Ambient,
}

/// Stylesheet build step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesheetConfig {
    /// Directory the hook is installed in. The source root is its sibling.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Name of the source root directory next to `install_dir`.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Compiler project file, relative to the source root. Discovered by
    /// convention when unset.
    #[serde(default)]
    pub project_file: Option<PathBuf>,

    /// Compiler backend.
    #[serde(default)]
    pub backend: Backend,

    /// Working-directory handling.
    #[serde(default)]
    pub isolation: Isolation,

    /// Program run by the external backend.
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments for the external backend. `{config}` expands to the project file.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Kill the external compiler after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Silence `@warn` and `@debug` output from the grass backend.
    #[serde(default)]
    pub quiet: bool,
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("_plugins")
}

fn default_source_dir() -> String {
    "_sass".to_string()
}

fn default_command() -> String {
    "compass".to_string()
}

fn default_args() -> Vec<String> {
    vec!["compile".to_string()]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            source_dir: default_source_dir(),
            project_file: None,
            backend: Backend::default(),
            isolation: Isolation::default(),
            command: default_command(),
            args: default_args(),
            timeout_secs: None,
            quiet: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, layering `STYLEGEN__*`
    /// environment variables over the file.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("STYLEGEN").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        let sheets = &self.stylesheets;

        if sheets.install_dir.as_os_str().is_empty() {
            return Err(CoreError::config("stylesheets.install_dir cannot be empty"));
        }

        if sheets.source_dir.trim().is_empty() {
            return Err(CoreError::config("stylesheets.source_dir cannot be empty"));
        }

        if Path::new(&sheets.source_dir).is_absolute() {
            return Err(CoreError::config(
                "stylesheets.source_dir must be relative to the install directory's parent",
            ));
        }

        if let Some(project_file) = &sheets.project_file
            && project_file.is_absolute()
        {
            return Err(CoreError::config(
                "stylesheets.project_file must be relative to the source root",
            ));
        }

        if sheets.backend == Backend::External && sheets.command.trim().is_empty() {
            return Err(CoreError::config(
                "stylesheets.command cannot be empty with the external backend",
            ));
        }

        if sheets.timeout_secs == Some(0) {
            return Err(CoreError::config("stylesheets.timeout_secs must be positive"));
        }

        if sheets.timeout_secs.is_some() && sheets.backend == Backend::Grass {
            tracing::warn!("stylesheets.timeout_secs only applies to the external backend");
        }

        Ok(())
    }
}

/// The host build context handed to build steps.
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Absolute or working-directory-relative site root.
    pub root: PathBuf,

    /// Loaded host configuration.
    pub config: Config,
}

impl SiteContext {
    /// Create a context from an already loaded configuration.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Load the configuration at `path` and resolve the site root against the
    /// directory that holds it.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::resolve(path, Config::load(path)?))
    }

    /// Like [`SiteContext::load`], with `STYLEGEN__*` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Ok(Self::resolve(path, Config::load_with_env(path)?))
    }

    fn resolve(path: &Path, config: Config) -> Self {
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let root = base.join(&config.site.root);
        Self::new(root, config)
    }
}
