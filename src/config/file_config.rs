//! Configuration file support for journal-xml.
//!
//! The file is looked up in this order: `--config PATH`, `./journal-xml.toml`,
//! then `<config_dir>/journal-xml/config.toml`. Any value can be overridden with
//! an environment variable such as `JOURNAL_XML_OUTPUT__INDENT=2`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [output]
//! indent = 3
//! declaration = false
//! default_file_stem = "Untitled_Article"
//!
//! [workbook]
//! header_row = true
//! declaration = true
//! layout = "form"
//!
//! [workbook.sheets]
//! journal = "Journal"
//! article = "Article"
//! authors = "Author(s)"
//!
//! [[presets]]
//! name = "JDS"
//! [presets.fields]
//! title = "Journal of Dental Sciences"
//! language = "en"
//!
//! [logging]
//! level = "warn"
//! ```

use super::Config;
use std::path::{Path, PathBuf};

const LOCAL_FILE_NAME: &str = "journal-xml.toml";
const APP_DIR_NAME: &str = "journal-xml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Candidate configuration files, most specific first
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR_NAME).join("config.toml"));
    }
    paths
}

/// The first existing file from [`config_search_paths`]
pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths().into_iter().find(|p| p.is_file())
}

/// Write configuration as TOML, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
}
