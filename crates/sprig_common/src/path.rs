//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Normalizes `.` and `..` components without touching the filesystem.
///
/// A `..` that would climb above the root of an absolute path is dropped;
/// on a relative path it is kept. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Returns `true` if `url` starts with a scheme such as `http:` or `data:`.
///
/// A single-letter scheme is treated as a Windows drive letter, not a scheme.
pub fn has_url_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_current_dir_segments() {
        assert_eq!(
            normalize_path(Path::new("/site/./css/./a.gif")),
            PathBuf::from("/site/css/a.gif")
        );
    }

    #[test]
    fn resolves_parent_segments() {
        assert_eq!(
            normalize_path(Path::new("/site/css/../i/a.gif")),
            PathBuf::from("/site/i/a.gif")
        );
    }

    #[test]
    fn parent_above_root_is_dropped() {
        assert_eq!(
            normalize_path(Path::new("/../../a.gif")),
            PathBuf::from("/a.gif")
        );
    }

    #[test]
    fn relative_parent_is_kept() {
        assert_eq!(
            normalize_path(Path::new("../a/../b.gif")),
            PathBuf::from("../b.gif")
        );
    }

    #[test]
    fn detects_schemes() {
        assert!(has_url_scheme("http://example.com/a.png"));
        assert!(has_url_scheme("data:image/png;base64,AAAA"));
        assert!(!has_url_scheme("images/a.png"));
        assert!(!has_url_scheme("/i/a.png"));
        assert!(!has_url_scheme("C:/i/a.png"));
    }
}
