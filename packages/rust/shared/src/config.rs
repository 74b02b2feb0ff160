//! Application configuration for nbindex.
//!
//! User config lives at `~/.nbindex/nbindex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbIndexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbindex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbindex";

// ---------------------------------------------------------------------------
// Config structs (matching nbindex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Filesystem layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Index artifact settings.
    #[serde(default)]
    pub index: IndexConfig,
}

/// `[layout]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Extension of exported page content files, without the dot.
    #[serde(default = "default_content_extension")]
    pub content_extension: String,

    /// Maximum length of a sanitized file or folder name.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            content_extension: default_content_extension(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_content_extension() -> String {
    "html".into()
}
fn default_max_name_length() -> usize {
    crate::naming::DEFAULT_MAX_NAME_LENGTH
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// File name of the human-readable index.
    #[serde(default = "default_markdown_file")]
    pub markdown_file: String,

    /// File name of the machine-readable inventory.
    #[serde(default = "default_json_file")]
    pub json_file: String,

    /// How many scan errors are listed verbatim in the Markdown index.
    #[serde(default = "default_max_listed_errors")]
    pub max_listed_errors: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            markdown_file: default_markdown_file(),
            json_file: default_json_file(),
            max_listed_errors: default_max_listed_errors(),
        }
    }
}

fn default_markdown_file() -> String {
    "index.md".into()
}
fn default_json_file() -> String {
    "index.json".into()
}
fn default_max_listed_errors() -> usize {
    20
}

// ---------------------------------------------------------------------------
// Build options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for a single index build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Extension of page content files (e.g. `html`).
    pub content_extension: String,
    /// Maximum sanitized name length.
    pub max_name_length: usize,
    /// Errors listed verbatim in `index.md` before eliding the rest.
    pub max_listed_errors: usize,
    /// File name for the Markdown index.
    pub markdown_file: String,
    /// File name for the JSON inventory.
    pub json_file: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for BuildOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            content_extension: config.layout.content_extension.clone(),
            max_name_length: config.layout.max_name_length,
            max_listed_errors: config.index.max_listed_errors,
            markdown_file: config.index.markdown_file.clone(),
            json_file: config.index.json_file.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbindex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| NbIndexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbindex/nbindex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbIndexError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| NbIndexError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbIndexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbIndexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbIndexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings that would produce unusable paths.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.layout.max_name_length == 0 {
        return Err(NbIndexError::config("layout.max_name_length must be at least 1"));
    }
    let ext = &config.layout.content_extension;
    if ext.is_empty() || ext.contains(['/', '\\', '.']) {
        return Err(NbIndexError::config(format!(
            "layout.content_extension '{ext}' must be a bare extension like \"html\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("content_extension"));
        assert!(toml_str.contains("index.md"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[layout]
content_extension = "md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.layout.content_extension, "md");
        assert_eq!(config.layout.max_name_length, 200);
        assert_eq!(config.index.max_listed_errors, 20);
        assert_eq!(config.index.json_file, "index.json");
    }

    #[test]
    fn build_options_from_app_config() {
        let opts = BuildOptions::from(&AppConfig::default());
        assert_eq!(opts.content_extension, "html");
        assert_eq!(opts.max_name_length, 200);
        assert_eq!(opts.max_listed_errors, 20);
        assert_eq!(opts.markdown_file, "index.md");
    }

    #[test]
    fn rejects_dotted_extension() {
        let mut config = AppConfig::default();
        config.layout.content_extension = ".html".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("bare extension"));
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let path = std::env::temp_dir()
            .join(format!("nbindex-config-test-{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[layout\nbroken").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_file(&path);
    }
}
