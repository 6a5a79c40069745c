//! Compiler project files.
//!
//! Reads the Compass-style `config.rb` subset that drives the in-process
//! backend: plain `key = value` assignments plus `add_import_path` calls.
//!
//! ```ruby
//! css_dir = "css"
//! sass_dir = "sass"
//! output_style = :compressed
//! add_import_path "vendor"
//! ```

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{CompileError, Result};

/// CSS output formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

impl From<OutputStyle> for grass::OutputStyle {
    fn from(style: OutputStyle) -> Self {
        match style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Settings read from a project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Stylesheet sources, relative to the source root.
    pub sass_dir: PathBuf,

    /// Output directory, relative to the source root.
    pub css_dir: PathBuf,

    /// Output formatting.
    pub output_style: OutputStyle,

    /// Extra directories searched by `@import`, relative to the source root.
    pub import_paths: Vec<PathBuf>,

    /// Recognised settings that do not affect CSS output (asset paths and
    /// the like), kept verbatim.
    pub other: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            sass_dir: PathBuf::from("sass"),
            css_dir: PathBuf::from("stylesheets"),
            output_style: OutputStyle::default(),
            import_paths: Vec::new(),
            other: BTreeMap::new(),
        }
    }
}

/// Keys accepted but not used when producing CSS.
const PASSTHROUGH_KEYS: &[&str] = &[
    "project_path",
    "http_path",
    "images_dir",
    "javascripts_dir",
    "fonts_dir",
    "line_comments",
    "relative_assets",
    "preferred_syntax",
    "environment",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Symbol(String),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    fn describe(&self) -> String {
        match self {
            Self::Str(s) | Self::Symbol(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => items.join(","),
        }
    }
}

impl ProjectConfig {
    /// Load and parse the project file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CompileError::config(path, "project file not found"),
            _ => CompileError::filesystem(path, e),
        })?;
        Self::parse(&content, path)
    }

    /// Parse project file content. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut config = Self::default();

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let err = |message: String| CompileError::config(path, format!("line {line_no}: {message}"));

            if let Some(rest) = line.strip_prefix("add_import_path") {
                let arg = rest.trim();
                let arg = arg
                    .strip_prefix('(')
                    .and_then(|a| a.strip_suffix(')'))
                    .unwrap_or(arg)
                    .trim();
                let import = parse_string(arg)
                    .ok_or_else(|| err(format!("add_import_path expects a string, got `{arg}`")))?;
                config.import_paths.push(PathBuf::from(import));
                continue;
            }

            if line.starts_with("require ") {
                warn!(path = %path.display(), line = line_no, "ignoring compiler plugin: {line}");
                continue;
            }

            let Some((key, raw_value)) = line.split_once('=') else {
                return Err(err(format!("expected `key = value`, got `{line}`")));
            };
            let key = key.trim();
            if !is_identifier(key) {
                return Err(err(format!("invalid setting name `{key}`")));
            }
            let raw_value = raw_value.trim();

            match key {
                "sass_dir" | "css_dir" => {
                    let dir = match parse_value(raw_value) {
                        Some(Value::Str(s)) => PathBuf::from(s),
                        _ => return Err(err(format!("{key} expects a string, got `{raw_value}`"))),
                    };
                    if key == "sass_dir" {
                        config.sass_dir = dir;
                    } else {
                        config.css_dir = dir;
                    }
                }
                "output_style" => {
                    let style = match parse_value(raw_value) {
                        Some(Value::Symbol(s) | Value::Str(s)) => s,
                        _ => {
                            return Err(err(format!(
                                "output_style expects a symbol, got `{raw_value}`"
                            )));
                        }
                    };
                    config.output_style = match style.as_str() {
                        "expanded" => OutputStyle::Expanded,
                        "compressed" => OutputStyle::Compressed,
                        "nested" | "compact" => {
                            debug!(style = %style, "output style rendered as expanded");
                            OutputStyle::Expanded
                        }
                        other => return Err(err(format!("unknown output_style `{other}`"))),
                    };
                }
                "additional_import_paths" => match parse_value(raw_value) {
                    Some(Value::List(items)) => {
                        config.import_paths.extend(items.into_iter().map(PathBuf::from));
                    }
                    Some(Value::Str(s)) => config.import_paths.push(PathBuf::from(s)),
                    _ => {
                        return Err(err(format!(
                            "additional_import_paths expects a list of strings, got `{raw_value}`"
                        )));
                    }
                },
                key if PASSTHROUGH_KEYS.contains(&key) => match parse_value(raw_value) {
                    Some(value) => {
                        config.other.insert(key.to_string(), value.describe());
                    }
                    None => {
                        warn!(path = %path.display(), line = line_no, key, "ignoring unsupported value");
                    }
                },
                _ => {
                    warn!(path = %path.display(), line = line_no, key, "ignoring unknown setting");
                }
            }
        }

        Ok(config)
    }
}

/// Drop a trailing `#` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn parse_string(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = s[1..].strip_suffix(quote)?;
    (!inner.contains(quote)).then(|| inner.to_string())
}

fn parse_value(s: &str) -> Option<Value> {
    match s {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    if let Some(symbol) = s.strip_prefix(':') {
        return is_identifier(symbol).then(|| Value::Symbol(symbol.to_string()));
    }

    if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let inner = inner.trim();
        if inner.is_empty() {
            return Some(Value::List(Vec::new()));
        }
        return inner
            .split(',')
            .map(|item| parse_string(item.trim()))
            .collect::<Option<Vec<_>>>()
            .map(Value::List);
    }

    parse_string(s).map(Value::Str)
}
