//! Scan settings and url resolution.

use serde::{Deserialize, Serialize};
use sprig_common::{has_url_scheme, normalize_path};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Caller-supplied settings for one scan.
///
/// The settings are part of the cache fingerprint, so changing the ignore
/// list or image root invalidates previous scan results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Directory that root-relative (`/...`) urls resolve against; the style
    /// sheet's directory when unset.
    pub image_root: Option<PathBuf>,
    /// Images excluded from assembly. Absolute paths are used as given,
    /// relative ones resolve against the style sheet's directory.
    pub ignore: Vec<String>,
}

/// Resolves image urls for one style sheet.
#[derive(Clone, Debug)]
pub struct UrlResolver {
    sheet_dir: PathBuf,
    image_root: PathBuf,
    ignore: HashSet<PathBuf>,
}

impl UrlResolver {
    /// Creates a resolver for the style sheet at `sheet_path`.
    pub fn new(sheet_path: &Path, settings: &ScanSettings) -> Self {
        let sheet_dir = sheet_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let image_root = settings
            .image_root
            .clone()
            .unwrap_or_else(|| sheet_dir.clone());
        let ignore = settings
            .ignore
            .iter()
            .map(|entry| {
                let entry = Path::new(strip_query(entry.trim()));
                if entry.is_absolute() {
                    normalize_path(entry)
                } else {
                    normalize_path(&sheet_dir.join(entry))
                }
            })
            .collect();
        Self {
            sheet_dir,
            image_root,
            ignore,
        }
    }

    /// Resolves a url to a normalized path; `None` for external or empty urls.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let url = strip_query(url.trim());
        if url.is_empty() || url.starts_with("//") || has_url_scheme(url) {
            return None;
        }
        let resolved = match url.strip_prefix('/') {
            Some(rest) => self.image_root.join(rest),
            None => self.sheet_dir.join(url),
        };
        Some(normalize_path(&resolved))
    }

    /// Returns `true` if `path` (as returned by [`resolve`](Self::resolve)) is ignored.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.contains(path)
    }
}

fn strip_query(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Returns `true` for the raster formats a sprite can hold.
pub fn is_raster_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "png" | "gif" | "jpg" | "jpeg" | "bmp"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(settings: ScanSettings) -> UrlResolver {
        UrlResolver::new(Path::new("/site/css/main.css"), &settings)
    }

    #[test]
    fn relative_urls_resolve_against_sheet_dir() {
        let r = resolver(ScanSettings::default());
        assert_eq!(r.resolve("../i/a.gif"), Some(PathBuf::from("/site/i/a.gif")));
        assert_eq!(r.resolve("./b.png?v=3#x"), Some(PathBuf::from("/site/css/b.png")));
    }

    #[test]
    fn root_relative_urls_use_image_root() {
        let r = resolver(ScanSettings {
            image_root: Some(PathBuf::from("/site")),
            ignore: vec![],
        });
        assert_eq!(r.resolve("/i/a.gif"), Some(PathBuf::from("/site/i/a.gif")));

        let default_root = resolver(ScanSettings::default());
        assert_eq!(
            default_root.resolve("/i/a.gif"),
            Some(PathBuf::from("/site/css/i/a.gif"))
        );
    }

    #[test]
    fn external_urls_are_not_resolved() {
        let r = resolver(ScanSettings::default());
        assert_eq!(r.resolve("http://cdn.example.com/a.png"), None);
        assert_eq!(r.resolve("//cdn.example.com/a.png"), None);
        assert_eq!(r.resolve("data:image/png;base64,AAAA"), None);
        assert_eq!(r.resolve(""), None);
    }

    #[test]
    fn ignore_entries_absolute_and_relative() {
        let r = resolver(ScanSettings {
            image_root: None,
            ignore: vec!["/site/i/1.gif".into(), "../i/2.gif".into()],
        });
        assert!(r.is_ignored(Path::new("/site/i/1.gif")));
        assert!(r.is_ignored(Path::new("/site/i/2.gif")));
        assert!(!r.is_ignored(Path::new("/site/i/3.gif")));
    }

    #[test]
    fn raster_extensions() {
        assert!(is_raster_image(Path::new("/i/a.PNG")));
        assert!(is_raster_image(Path::new("/i/a.jpeg")));
        assert!(!is_raster_image(Path::new("/i/a.svg")));
        assert!(!is_raster_image(Path::new("/i/a")));
    }
}
