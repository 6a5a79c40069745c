//! CLI command implementations.

pub mod check;
pub mod compile;
pub mod watch;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use stylegen_core::SiteContext;

/// Load the site context, layering `STYLEGEN__*` environment overrides over
/// the configuration file.
pub fn load_site(config_path: &Path) -> Result<SiteContext> {
    let site = SiteContext::load_with_env(config_path).wrap_err_with(|| {
        format!("Failed to load configuration from {}", config_path.display())
    })?;
    tracing::debug!(?site, "Loaded configuration");
    Ok(site)
}
