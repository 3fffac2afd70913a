//! Configuration file management for weft.
//!
//! Provides a TOML-based config file at `~/.config/weft/config.toml`. The
//! only setting today is the default plan path; resolution order is
//! CLI flag > env var > config file > project default (see `resolve`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub document: DocumentSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentSection {
    /// Plan file used when neither the CLI flag nor WEFT_PLAN is set.
    pub default_path: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the weft config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/weft` or `~/.config/weft`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("weft");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("weft")
}

/// Return the path to the weft config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let original = ConfigFile {
            document: DocumentSection {
                default_path: Some("docs/PLAN.md".to_string()),
            },
        };
        let contents = toml::to_string_pretty(&original).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.document.default_path, original.document.default_path);
    }

    #[test]
    fn empty_config_parses_with_defaults() {
        let loaded: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(loaded.document.default_path, None);
    }

    #[test]
    fn config_dir_honors_xdg_config_home() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig = std::env::var("XDG_CONFIG_HOME").ok();

        // SAFETY: serialized by mutex, test-only code.
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        let dir = config_dir();
        match orig {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        assert_eq!(dir, tmp.path().join("weft"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("weft/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
