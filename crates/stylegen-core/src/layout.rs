//! Directory layout resolution.
//!
//! The source root sits next to the directory the hook is installed in:
//! `parent(install_dir) / source_dir`. Inside it, the compiler's project
//! file is found by a fixed list of conventional names.

use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// Conventional project file locations, in lookup order.
pub const PROJECT_FILE_CANDIDATES: &[&str] = &[
    "config.rb",
    "config/compass.rb",
    ".compass/config.rb",
    "config/compass.config",
    "compass.rb",
];

/// Resolve the source root for a hook installed in `install_dir`.
///
/// A relative `install_dir` is taken relative to `site_root`. The result is
/// lexically normalised, so `site/_plugins/..` style inputs behave like the
/// directory they name.
pub fn source_root(site_root: &Path, install_dir: &Path, source_dir: &str) -> Result<PathBuf> {
    let install_dir = normalize(&site_root.join(install_dir));
    let parent = match install_dir.components().next_back() {
        Some(Component::Normal(_)) => install_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        Some(Component::ParentDir) => install_dir.join(".."),
        _ => {
            return Err(CoreError::layout(
                &install_dir,
                "install directory has no parent",
            ));
        }
    };

    Ok(normalize(&parent.join(source_dir)))
}

/// Find the project file inside `source_root`.
///
/// An explicit name wins when it exists; otherwise the first existing entry
/// of [`PROJECT_FILE_CANDIDATES`] is returned. The result is relative to
/// `source_root`.
pub fn find_project_file(source_root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(name) = explicit {
        return source_root
            .join(name)
            .is_file()
            .then(|| name.to_path_buf());
    }

    PROJECT_FILE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| source_root.join(candidate).is_file())
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading `..` on relative paths; they cannot be folded.
                let folded = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if folded {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_source_root_is_sibling_of_install_dir() {
        let root = source_root(Path::new("/site"), Path::new("_plugins"), "_sass").unwrap();
        assert_eq!(root, PathBuf::from("/site/_sass"));
    }

    #[test]
    fn test_source_root_with_absolute_install_dir() {
        let root =
            source_root(Path::new("/ignored"), Path::new("/opt/hooks/bin"), "styles").unwrap();
        assert_eq!(root, PathBuf::from("/opt/hooks/styles"));
    }

    #[test]
    fn test_source_root_normalises_dots() {
        let root = source_root(Path::new("/site/./a"), Path::new("../_plugins"), "_sass").unwrap();
        assert_eq!(root, PathBuf::from("/site/_sass"));
    }

    #[test]
    fn test_source_root_relative_site() {
        let root = source_root(Path::new("."), Path::new("_plugins"), "_sass").unwrap();
        assert_eq!(root, PathBuf::from("_sass"));
    }

    #[test]
    fn test_source_root_above_relative_site() {
        let root = source_root(Path::new("."), Path::new(".."), "_sass").unwrap();
        assert_eq!(root, PathBuf::from("../../_sass"));
    }

    #[test]
    fn test_source_root_without_parent() {
        let err = source_root(Path::new("/"), Path::new("/"), "_sass").unwrap_err();
        assert!(err.to_string().contains("no parent"));
    }

    #[test]
    fn test_find_project_file_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/compass.rb"), "").unwrap();
        fs::write(dir.path().join("compass.rb"), "").unwrap();

        let found = find_project_file(dir.path(), None);
        assert_eq!(found, Some(PathBuf::from("config/compass.rb")));

        fs::write(dir.path().join("config.rb"), "").unwrap();
        let found = find_project_file(dir.path(), None);
        assert_eq!(found, Some(PathBuf::from("config.rb")));
    }

    #[test]
    fn test_find_project_file_explicit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.rb"), "").unwrap();
        fs::write(dir.path().join("site.rb"), "").unwrap();

        let found = find_project_file(dir.path(), Some(Path::new("site.rb")));
        assert_eq!(found, Some(PathBuf::from("site.rb")));

        let missing = find_project_file(dir.path(), Some(Path::new("other.rb")));
        assert!(missing.is_none());
    }

    #[test]
    fn test_find_project_file_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config.rb")).unwrap();

        assert!(find_project_file(dir.path(), None).is_none());
    }
}
