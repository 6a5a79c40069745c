//! Stylegen Generator Library
//!
//! The build-pipeline step that compiles a site's stylesheets.
//!
//! # Modules
//!
//! - [`step`] - The compile step invoked once per site build
//! - [`workdir`] - Scoped process working directory

pub mod step;
pub mod workdir;

pub use step::{CompileReport, CompileStep};
pub use workdir::WorkingDirGuard;
