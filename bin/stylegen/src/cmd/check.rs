//! Check command - validate configuration and the stylesheet source tree

use std::{
    env,
    path::{Path, PathBuf},
};

use color_eyre::eyre::{Result, bail};
use stylegen_compiler::{ProjectConfig, builtin::collect_entries};
use stylegen_core::{Backend, SiteContext};
use stylegen_generator::CompileStep;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration and everything the compile step will touch,
/// without compiling anything.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and sources");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let site = match SiteContext::load_with_env(config_path) {
        Ok(site) => {
            println!("  ✓ Configuration valid");
            Some(site)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(ref site) = site {
        println!("\nChecking source root...");
        check_layout(site, &mut result);
    }

    print_summary(&result);

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_layout(site: &SiteContext, result: &mut ValidationResult) {
    let config = &site.config.stylesheets;
    let step = CompileStep::from_config(config);

    let install_dir = site.root.join(&config.install_dir);
    if !install_dir.is_dir() {
        result.add_warning(format!(
            "Install directory does not exist: {}",
            install_dir.display()
        ));
    }

    let source_root = match step.source_root(site) {
        Ok(root) if root.is_dir() => {
            println!("  ✓ Source root: {}", root.display());
            root
        }
        Ok(root) => {
            result.add_error(format!("Source root does not exist: {}", root.display()));
            return;
        }
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };

    let project_file = match step.project_file(&source_root) {
        Ok(file) => {
            println!("  ✓ Project file: {}", file.display());
            file
        }
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };

    match config.backend {
        Backend::Grass => check_project(&source_root, &project_file, result),
        Backend::External => {
            if find_program(&config.command).is_none() {
                result.add_error(format!("Compiler `{}` not found on PATH", config.command));
            } else {
                println!("  ✓ Compiler: {}", config.command);
            }
        }
    }
}

/// Validate what the in-process backend will read from the project file.
fn check_project(source_root: &Path, project_file: &Path, result: &mut ValidationResult) {
    let project = match ProjectConfig::load(&source_root.join(project_file)) {
        Ok(project) => project,
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };

    let sass_dir = source_root.join(&project.sass_dir);
    if !sass_dir.is_dir() {
        result.add_error(format!(
            "Stylesheet directory does not exist: {}",
            sass_dir.display()
        ));
        return;
    }

    match collect_entries(&sass_dir) {
        Ok(entries) if entries.is_empty() => {
            result.add_warning(format!("No stylesheets to compile in {}", sass_dir.display()));
        }
        Ok(entries) => println!("  ✓ {} stylesheet(s) in {}", entries.len(), sass_dir.display()),
        Err(e) => result.add_error(e.to_string()),
    }

    for import in &project.import_paths {
        let path = source_root.join(import);
        if !path.is_dir() {
            result.add_warning(format!("Import path does not exist: {}", path.display()));
        }
    }

    println!(
        "  ✓ Output directory: {}",
        source_root.join(&project.css_dir).display()
    );
}

/// Locate `program` the way a spawned process would.
fn find_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn print_summary(result: &ValidationResult) {
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }
}
