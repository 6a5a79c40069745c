//! Compile command - runs the stylesheet step once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use stylegen_core::Isolation;
use stylegen_generator::{CompileReport, CompileStep};

use super::load_site;

/// Run the compile command.
///
/// Compiles the site's stylesheets once, exactly as a site build would.
pub fn run(config_path: &Path, ambient: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ambient, "Starting stylesheet compile");

    let mut site = load_site(config_path)?;

    if ambient {
        tracing::info!("Overriding isolation from CLI");
        site.config.stylesheets.isolation = Isolation::Ambient;
    }

    let step = CompileStep::from_config(&site.config.stylesheets);
    let report = step.run(&site).wrap_err("Stylesheet compilation failed")?;

    print_report(step.compiler_name(), &report);

    tracing::info!(duration = ?start.elapsed(), "Compile finished");
    Ok(())
}

/// Print a compile report in a user-friendly format.
pub fn print_report(compiler: &str, report: &CompileReport) {
    println!();
    println!("  Stylesheets compiled successfully!");
    println!();
    println!("  Compiler:     {compiler}");
    println!("  Source root:  {}", report.source_root.display());
    println!("  Project file: {}", report.project_file.display());
    if report.manifest.is_empty() {
        println!("  Files:        (not reported)");
    } else {
        println!("  Files:        {}", report.manifest.len());
        for file in report.manifest.files() {
            println!("    {}", file.display());
        }
    }
    println!();
    println!("  Duration:     {}ms", report.duration_ms);
    println!();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_compile_command_builds_site() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("stylegen.toml");
        fs::write(&config_path, "[stylesheets]\nsource_dir = \"styles\"\n").unwrap();
        fs::create_dir_all(dir.path().join("styles/sass")).unwrap();
        fs::write(dir.path().join("styles/config.rb"), "css_dir = \"../public/css\"\n").unwrap();
        fs::write(
            dir.path().join("styles/sass/site.scss"),
            "nav { ul { margin: 0; } }\n",
        )
        .unwrap();

        run(&config_path, false).unwrap();

        let css = fs::read_to_string(dir.path().join("public/css/site.css")).unwrap();
        assert!(css.contains("nav ul"));
    }

    #[test]
    fn test_compile_command_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("stylegen.toml");
        fs::write(&config_path, "").unwrap();

        let err = run(&config_path, false).unwrap_err();
        assert!(format!("{err:#}").contains("Stylesheet compilation failed"));
    }
}
