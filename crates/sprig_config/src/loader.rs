//! Reading `sprig.toml` from disk or from a string.

use crate::error::ConfigError;
use crate::types::SprigConfig;
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "sprig.toml";

/// Loads `<project_dir>/sprig.toml`, or the defaults if there is none.
///
/// A relative `cache.root` or `sprite.image_root` is made relative to
/// `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<SprigConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        let mut config = SprigConfig::default();
        anchor_paths(&mut config, project_dir);
        return Ok(config);
    }
    load_config_file(&path)
}

/// Loads an explicit configuration file. Relative paths inside it are
/// anchored at the file's directory.
pub fn load_config_file(path: &Path) -> Result<SprigConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    anchor_paths(&mut config, path.parent().unwrap_or_else(|| Path::new(".")));
    Ok(config)
}

/// Parses and validates configuration text. Paths are left as written.
pub fn load_config_from_str(content: &str) -> Result<SprigConfig, ConfigError> {
    let config: SprigConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SprigConfig) -> Result<(), ConfigError> {
    if config.cache.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.root must not be empty".to_string(),
        ));
    }
    if let Some(idx) = config.sprite.ignore.iter().position(|p| p.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "sprite.ignore[{idx}] must not be empty"
        )));
    }
    Ok(())
}

fn anchor_paths(config: &mut SprigConfig, base: &Path) {
    if config.cache.root.is_relative() {
        config.cache.root = base.join(&config.cache.root);
    }
    if let Some(root) = config.sprite.image_root.as_mut() {
        if root.is_relative() {
            *root = base.join(&*root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_file_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.cache.enabled);
        assert!(config.cache.sweep);
        assert_eq!(config.cache.root, PathBuf::from(".sprig-cache"));
        assert!(config.sprite.ignore.is_empty());
        assert!(config.sprite.image_root.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
enabled = false
root = "build/cache"
sweep = false

[sprite]
image_root = "site"
ignore = ["/i/1.gif", "/i/2.gif"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.cache.enabled);
        assert!(!config.cache.sweep);
        assert_eq!(config.cache.root, PathBuf::from("build/cache"));
        assert_eq!(config.sprite.image_root, Some(PathBuf::from("site")));
        assert_eq!(config.sprite.ignore, vec!["/i/1.gif", "/i/2.gif"]);
    }

    #[test]
    fn ignore_accepts_single_string() {
        let config = load_config_from_str("[sprite]\nignore = \"/i/logo.png\"\n").unwrap();
        assert_eq!(config.sprite.ignore, vec!["/i/logo.png"]);
    }

    #[test]
    fn empty_cache_root_rejected() {
        let err = load_config_from_str("[cache]\nroot = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn blank_ignore_entry_rejected() {
        let err = load_config_from_str("[sprite]\nignore = [\"a.png\", \" \"]\n").unwrap_err();
        assert!(err.to_string().contains("sprite.ignore[1]"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("[cache\nroot=").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_yields_anchored_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.root, dir.path().join(".sprig-cache"));
    }

    #[test]
    fn relative_paths_anchor_at_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[cache]\nroot = \"c\"\n[sprite]\nimage_root = \"www\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.root, dir.path().join("c"));
        assert_eq!(config.sprite.image_root, Some(dir.path().join("www")));
    }
}
