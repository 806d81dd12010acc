//! Configuration management.

mod file_config;

pub use file_config::{config_search_paths, find_config_file, save_config, ConfigError};

use crate::codec::WriteOptions;
use crate::models::{JournalPreset, PresetRegistry, UNTITLED_STEM};
use crate::session::{Layout, SessionOptions};
use crate::workbook::{ReadOptions, SheetNames};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `JOURNAL_XML_OUTPUT__INDENT=2`
pub const ENV_PREFIX: &str = "JOURNAL_XML";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// XML output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Workbook conversion settings
    #[serde(default)]
    pub workbook: WorkbookConfig,

    /// Presets added to (or replacing) the built-in ones
    #[serde(default)]
    pub presets: Vec<JournalPreset>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,

    #[serde(default)]
    pub declaration: bool,

    /// File stem offered when the article has no title
    #[serde(default = "default_file_stem")]
    pub default_file_stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            declaration: false,
            default_file_stem: default_file_stem(),
        }
    }
}

fn default_indent() -> usize {
    3
}

fn default_file_stem() -> String {
    UNTITLED_STEM.to_string()
}

fn default_true() -> bool {
    true
}

/// Workbook configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookConfig {
    #[serde(default)]
    pub sheets: SheetNames,

    /// Whether the first row of each sheet is a header
    #[serde(default = "default_true")]
    pub header_row: bool,

    #[serde(default = "default_true")]
    pub declaration: bool,

    #[serde(default)]
    pub layout: Layout,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            sheets: SheetNames::default(),
            header_row: true,
            declaration: true,
            layout: Layout::Form,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Session settings derived from this configuration
    pub fn session_options(&self) -> SessionOptions {
        let write = WriteOptions {
            indent: self.output.indent,
            declaration: self.output.declaration,
        };
        SessionOptions {
            write,
            workbook_write: WriteOptions {
                declaration: self.workbook.declaration,
                ..write
            },
            read: ReadOptions {
                sheets: self.workbook.sheets.clone(),
                header_row: self.workbook.header_row,
            },
            layout: self.workbook.layout,
            fallback_stem: self.output.default_file_stem.clone(),
        }
    }

    /// Built-in presets merged with the configured ones
    pub fn preset_registry(&self) -> PresetRegistry {
        PresetRegistry::with_configured(&self.presets)
    }
}

/// Load configuration from an optional file, layered with `JOURNAL_XML_*` environment variables
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        tracing::debug!("Loading configuration from {}", path.display());
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find the configuration file and load it, falling back to defaults
pub fn get_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => load_config(Some(path)),
        None => load_config(find_config_file().as_deref()),
    }
}
