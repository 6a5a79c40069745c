//! Stylegen CLI
//!
//! Runs the stylesheet compile step of a static site build.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for stylegen.
#[derive(Parser)]
#[command(
    name = "stylegen",
    version,
    about = "Compile a static site's stylesheets as a build step"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stylegen.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Compile the stylesheets once
    Compile {
        /// Change the working directory to the source root while compiling
        #[arg(long)]
        ambient: bool,
    },
    /// Validate configuration and the stylesheet source tree
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Recompile whenever a stylesheet source changes
    Watch {
        /// Quiet period before recompiling, in milliseconds
        #[arg(long, default_value_t = 200)]
        debounce_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    stylegen::init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile { ambient } => {
            stylegen::cmd::compile::run(&cli.config, ambient)?;
        }
        Commands::Check { strict } => {
            stylegen::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Watch { debounce_ms } => {
            stylegen::cmd::watch::run(&cli.config, debounce_ms).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_compile_command_parsing() {
        let args = ["stylegen", "compile"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("stylegen.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Compile { ambient } => assert!(!ambient),
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_cli_compile_ambient() {
        let args = ["stylegen", "compile", "--ambient"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Compile { ambient } => assert!(ambient),
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["stylegen", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => assert!(strict),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_watch_command_parsing() {
        let cli = Cli::parse_from(["stylegen", "watch"]);
        match cli.command {
            Commands::Watch { debounce_ms } => assert_eq!(debounce_ms, 200),
            _ => panic!("Expected Watch command"),
        }

        let cli = Cli::parse_from(["stylegen", "watch", "--debounce-ms", "50"]);
        match cli.command {
            Commands::Watch { debounce_ms } => assert_eq!(debounce_ms, 50),
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["stylegen", "-vvv", "compile"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["stylegen", "--config", "site/stylegen.toml", "check"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, std::path::PathBuf::from("site/stylegen.toml"));
    }
}
