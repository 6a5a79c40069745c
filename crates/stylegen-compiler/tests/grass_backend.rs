//! Integration tests for the in-process backend against on-disk projects.

use std::{fs, path::Path};

use stylegen_compiler::{ErrorKind, GrassCompiler, StylesheetCompiler};
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_partial_import_is_concatenated() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.rb", "css_dir = \"css\"\nsass_dir = \"sass\"\n");
    write(
        dir.path(),
        "sass/_partial.scss",
        "$accent: #c0ffee;\n.partial { margin: 0; }\n",
    );
    write(
        dir.path(),
        "sass/main.scss",
        "@import \"partial\";\n.main { color: $accent; }\n",
    );

    let manifest = GrassCompiler::new()
        .compile(dir.path(), Path::new("config.rb"))
        .unwrap();

    assert_eq!(manifest.len(), 1);
    assert!(!dir.path().join("css/_partial.css").exists());

    let css = fs::read_to_string(dir.path().join("css/main.css")).unwrap();
    let partial = css.find(".partial").expect("partial rules present");
    let main = css.find(".main").expect("main rules present");
    assert!(partial < main, "imported rules come first:\n{css}");
    assert!(css.contains("#c0ffee"));
}

#[test]
fn test_syntax_error_carries_file_and_line() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.rb", "css_dir = \"css\"\n");
    write(dir.path(), "sass/main.scss", "a {\n  color: ;\n}\n");

    let err = GrassCompiler::new()
        .compile(dir.path(), Path::new("config.rb"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Compilation);
    let message = err.to_string();
    assert!(message.contains("main.scss"), "{message}");
    assert!(message.contains("main.scss 2:"), "{message}");
}

#[test]
fn test_unresolvable_import_is_compilation_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.rb", "");
    write(dir.path(), "sass/main.scss", "@import \"missing\";\n");

    let err = GrassCompiler::new()
        .compile(dir.path(), Path::new("config.rb"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("main.scss"));
}

#[test]
fn test_first_failure_in_path_order_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.rb", "");
    write(dir.path(), "sass/a.scss", "a { color: ; }\n");
    write(dir.path(), "sass/b.scss", "b { color: ; }\n");
    write(dir.path(), "sass/c.scss", "c { color: red; }\n");

    let err = GrassCompiler::new()
        .compile(dir.path(), Path::new("config.rb"))
        .unwrap_err();

    match err {
        stylegen_compiler::CompileError::Compilation { path, .. } => {
            assert!(path.ends_with("a.scss"), "{}", path.display());
        }
        other => panic!("expected compilation error, got {other}"),
    }
}

#[test]
fn test_malformed_project_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.rb", "css_dir \"css\"\n");
    write(dir.path(), "sass/main.scss", "a { color: red; }\n");

    let err = GrassCompiler::new()
        .compile(dir.path(), Path::new("config.rb"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("line 1"));
}
