//! In-process SCSS/Sass compilation.
//!
//! This backend uses [`grass`] under the hood and follows the project file
//! for its source and output directories.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    OutputManifest, StylesheetCompiler,
    error::{CompileError, Result},
    project::{OutputStyle, ProjectConfig},
};

/// Extensions treated as stylesheet sources.
const SOURCE_EXTENSIONS: &[&str] = &["scss", "sass"];

/// Compiles every non-partial stylesheet under the project's `sass_dir`.
#[derive(Debug, Clone, Default)]
pub struct GrassCompiler {
    quiet: bool,
}

impl GrassCompiler {
    /// Create a new compiler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Silence `@warn` and `@debug` output from stylesheets.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn compile_entry(
        &self,
        source: &Path,
        dest: &Path,
        load_paths: &[PathBuf],
        style: OutputStyle,
    ) -> Result<PathBuf> {
        let options = grass::Options::default()
            .style(style.into())
            .load_paths(load_paths)
            .quiet(self.quiet);

        let css = grass::from_path(source, &options)
            .map_err(|e| CompileError::compilation(source, e.to_string()))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::filesystem(parent, e))?;
        }
        fs::write(dest, css).map_err(|e| CompileError::filesystem(dest, e))?;

        debug!(source = %source.display(), dest = %dest.display(), "compiled stylesheet");
        Ok(dest.to_path_buf())
    }
}

impl StylesheetCompiler for GrassCompiler {
    fn name(&self) -> &str {
        "grass"
    }

    fn compile(&self, source_root: &Path, project_file: &Path) -> Result<OutputManifest> {
        let start = Instant::now();
        let project = ProjectConfig::load(&source_root.join(project_file))?;

        let sass_dir = source_root.join(&project.sass_dir);
        let css_dir = source_root.join(&project.css_dir);
        if !sass_dir.is_dir() {
            return Err(CompileError::missing_dir(&sass_dir));
        }

        let entries = collect_entries(&sass_dir)?;
        if entries.is_empty() {
            warn!(sass_dir = %sass_dir.display(), "no stylesheets to compile");
            return Ok(OutputManifest::new());
        }

        let load_paths: Vec<PathBuf> = std::iter::once(sass_dir.clone())
            .chain(project.import_paths.iter().map(|p| source_root.join(p)))
            .collect();

        info!(
            count = entries.len(),
            sass_dir = %sass_dir.display(),
            css_dir = %css_dir.display(),
            "compiling stylesheets"
        );

        // Entries are independent; compile in parallel, report in path order.
        let results: Vec<_> = entries
            .par_iter()
            .map(|rel| {
                let dest = css_dir.join(rel).with_extension("css");
                self.compile_entry(&sass_dir.join(rel), &dest, &load_paths, project.output_style)
            })
            .collect();

        let mut manifest = OutputManifest::new();
        for result in results {
            manifest.push(result?);
        }

        info!(
            files = manifest.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "stylesheets compiled"
        );
        Ok(manifest)
    }
}

/// Entry points under `sass_dir`, relative to it, sorted. Partials (names
/// starting with `_`) are only reachable through imports.
pub fn collect_entries(sass_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(sass_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(sass_dir).to_path_buf();
            CompileError::filesystem(path, e.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        let is_partial = entry.file_name().to_string_lossy().starts_with('_');

        if is_source && !is_partial {
            let rel = path.strip_prefix(sass_dir).unwrap_or(path);
            entries.push(rel.to_path_buf());
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_collect_entries_skips_partials() {
        let dir = project(&[
            ("sass/main.scss", ""),
            ("sass/_partial.scss", ""),
            ("sass/pages/home.sass", ""),
            ("sass/notes.txt", ""),
        ]);

        let entries = collect_entries(&dir.path().join("sass")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("main.scss"), PathBuf::from("pages/home.sass")]
        );
    }

    #[test]
    fn test_compile_nested_rules() {
        let dir = project(&[
            ("config.rb", "css_dir = \"css\"\n"),
            ("sass/main.scss", ".outer {\n  .inner {\n    color: black;\n  }\n}\n"),
        ]);

        let manifest = GrassCompiler::new()
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap();

        let out = dir.path().join("css/main.css");
        assert_eq!(manifest.files(), &[out.clone()]);
        assert_eq!(
            fs::read_to_string(out).unwrap(),
            ".outer .inner {\n  color: black;\n}\n"
        );
    }

    #[test]
    fn test_compile_compressed_mirrors_directories() {
        let dir = project(&[
            ("config.rb", "css_dir = \"out\"\noutput_style = :compressed\n"),
            ("sass/pages/home.scss", "a { b { color: red; } }\n"),
        ]);

        GrassCompiler::new()
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap();

        let css = fs::read_to_string(dir.path().join("out/pages/home.css")).unwrap();
        assert_eq!(css.trim(), "a b{color:red}");
    }

    #[test]
    fn test_additional_import_path() {
        let dir = project(&[
            ("config.rb", "css_dir = \"css\"\nadd_import_path \"vendor\"\n"),
            ("vendor/_colors.scss", "$brand: #123456;\n"),
            ("sass/site.scss", "@import \"colors\";\nbody { color: $brand; }\n"),
        ]);

        GrassCompiler::new()
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap();

        let css = fs::read_to_string(dir.path().join("css/site.css")).unwrap();
        assert!(css.contains("#123456"));
    }

    #[test]
    fn test_missing_sass_dir() {
        let dir = project(&[("config.rb", "sass_dir = \"styles\"\n")]);

        let err = GrassCompiler::new()
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Filesystem);
    }

    #[test]
    fn test_empty_sass_dir_is_not_an_error() {
        let dir = project(&[("config.rb", ""), ("sass/_only_partial.scss", "")]);

        let manifest = GrassCompiler::new()
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap();
        assert!(manifest.is_empty());
        assert!(!dir.path().join("stylesheets").exists());
    }

    #[test]
    fn test_quiet_compile_with_warnings() {
        let dir = project(&[
            ("config.rb", "css_dir = \"css\"\n"),
            ("sass/main.scss", "@warn \"deprecated\";\na { color: red; }\n"),
        ]);

        GrassCompiler::new()
            .quiet(true)
            .compile(dir.path(), Path::new("config.rb"))
            .unwrap();

        let css = fs::read_to_string(dir.path().join("css/main.css")).unwrap();
        assert!(css.contains("color: red"));
    }
}
