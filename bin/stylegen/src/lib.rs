//! Stylegen CLI Library
//!
//! Command implementations for the stylegen binary, exposed as a library so
//! they can be documented and driven from other tools.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (compile, check, watch)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use stylegen::cmd;
//!
//! // Compile the site's stylesheets once
//! cmd::compile::run(Path::new("stylegen.toml"), false).unwrap();
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use stylegen_core::{Config, SiteContext};
pub use stylegen_generator::{CompileReport, CompileStep};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
