//! Stylegen Core Library
//!
//! Host configuration, error handling and directory-layout resolution for the
//! stylegen stylesheet build step.

pub mod config;
pub mod error;
pub mod layout;

pub use config::{Backend, Config, Isolation, SiteContext, StylesheetConfig};
pub use error::{CoreError, Result};
pub use layout::{PROJECT_FILE_CANDIDATES, find_project_file, source_root};
