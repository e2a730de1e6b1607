//! Ready-made processors for [`codec::decode_with`](crate::codec::decode_with)

use std::path::{Component, Path, PathBuf};

use crate::container::Field;

/// Leaves every value untouched
pub fn identity(_key: &str, value: Field) -> Field {
    value
}

/// Resolves string values whose key contains `"path"`.
///
/// A leading `~` is expanded to the home directory and relative paths are
/// made absolute against the current directory.
pub fn resolve_paths(key: &str, value: Field) -> Field {
    match value {
        Field::String(raw) if key.contains("path") => Field::String(resolve_path(&raw)),
        other => other,
    }
}

/// Expand `~`, absolutize and lexically normalize a path
pub fn resolve_path(raw: &str) -> String {
    let expanded = expand_home(raw);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(e) => {
                log::warn!("Cannot resolve '{}' against current directory: {}", raw, e);
                expanded
            }
        }
    };
    normalize(&absolute).to_string_lossy().into_owned()
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // never climb above the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_path_keys_are_resolved() {
        let field = resolve_paths("name", Field::from("~/proj"));
        assert_eq!(field, Field::from("~/proj"));

        let field = resolve_paths("data_path", Field::Integer(3));
        assert_eq!(field, Field::Integer(3));
    }

    #[test]
    fn test_home_expansion() {
        let home = dirs::home_dir().expect("tests need a home directory");
        let field = resolve_paths("path", Field::from("~/proj/devtools/utils"));
        assert_eq!(
            field,
            Field::String(home.join("proj/devtools/utils").to_string_lossy().into_owned())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_normalization() {
        assert_eq!(resolve_path("/a/./b/../c"), "/a/c");
        assert_eq!(resolve_path("/../x"), "/x");
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let resolved = resolve_path("some/dir");
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("dir"));
    }
}
