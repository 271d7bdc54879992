//! Site configuration.
//!
//! Settings are layered: stock defaults, then an optional `config.toml`, then
//! command-line flags. Every key is optional; a config file only needs the
//! values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! foundation_year = 1920        # Year the winery was founded
//!
//! [data]
//! path = "wine3.xlsx"           # Product spreadsheet (xlsx, xls, ods)
//! sheet = "Лист1"               # Sheet holding the products
//! category_column = "Категория" # Column the page is grouped by
//! missing_sentinel = "Nan"      # Cell text treated as "no value" ("" disables)
//!
//! [template]
//! dir = "."                     # Directory the template is looked up in
//! name = "template.html"        # Template file name
//! strict = false                # Fail on references to unknown variables
//!
//! [output]
//! path = "index.html"           # Where the rendered page is written
//!
//! [server]
//! host = "0.0.0.0"              # Address to bind
//! port = 8000
//! root = "."                    # Directory served as static files
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::records::LoadOptions;
use crate::render::TemplateOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Year the winery was founded; the page shows the years since.
    pub foundation_year: i32,
    /// Where product data comes from.
    pub data: DataConfig,
    /// Page template lookup and engine settings.
    pub template: TemplateConfig,
    /// Rendered page destination.
    pub output: OutputConfig,
    /// Static file server settings.
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            foundation_year: 1920,
            data: DataConfig::default(),
            template: TemplateConfig::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.sheet.is_empty() {
            return Err(ConfigError::Validation("data.sheet must not be empty".into()));
        }
        if self.data.category_column.is_empty() {
            return Err(ConfigError::Validation(
                "data.category_column must not be empty".into(),
            ));
        }
        if self.template.name.is_empty() {
            return Err(ConfigError::Validation(
                "template.name must not be empty".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub path: PathBuf,
    pub sheet: String,
    pub category_column: String,
    /// Cell text read as a missing value. Empty disables the check.
    pub missing_sentinel: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("wine3.xlsx"),
            sheet: "Лист1".to_string(),
            category_column: "Категория".to_string(),
            missing_sentinel: "Nan".to_string(),
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            missing_sentinel: (!self.missing_sentinel.is_empty())
                .then(|| self.missing_sentinel.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    pub dir: PathBuf,
    pub name: String,
    pub strict: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            name: "template.html".to_string(),
            strict: false,
        }
    }
}

impl TemplateConfig {
    pub fn options(&self) -> TemplateOptions {
        TemplateOptions {
            strict: self.strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("index.html"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                ConfigError::Validation(format!(
                    "server.host '{}' is not an IP address",
                    self.host
                ))
            })
    }
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_path: Option<PathBuf>,
    pub sheet: Option<String>,
    pub template_name: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Overrides {
    pub fn apply(self, config: &mut SiteConfig) {
        if let Some(path) = self.data_path {
            config.data.path = path;
        }
        if let Some(sheet) = self.sheet {
            config.data.sheet = sheet;
        }
        if let Some(name) = self.template_name {
            config.template.name = name;
        }
        if let Some(dir) = self.template_dir {
            config.template.dir = dir;
        }
        if let Some(path) = self.output_path {
            config.output.path = path;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `path`, falling back to stock defaults.
///
/// CLI `overrides` are applied last; the result is validated.
pub fn load_config(path: &Path, overrides: Overrides) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let mut config: SiteConfig = merged.try_into()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// A fully-commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Winery Site Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# Year the winery was founded. The page shows the years since then.
foundation_year = 1920

# ---------------------------------------------------------------------------
# Product data
# ---------------------------------------------------------------------------
[data]
# Spreadsheet with one product per row (xlsx, xls or ods).
path = "wine3.xlsx"

# Sheet holding the products. The first row names the columns.
sheet = "Лист1"

# Column products are grouped by. Every row must have it.
category_column = "Категория"

# Cell text read as "no value". Empty cells are always plain empty text.
# Set to "" to disable.
missing_sentinel = "Nan"

# ---------------------------------------------------------------------------
# Page template (Handlebars)
# ---------------------------------------------------------------------------
[template]
# Directory the template is looked up in.
dir = "."

# Template file name. It receives `winery_age` and `drinks_by_category`.
name = "template.html"

# Fail the build when the template references an unknown variable.
strict = false

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
path = "index.html"

# ---------------------------------------------------------------------------
# Static file server
# ---------------------------------------------------------------------------
[server]
host = "0.0.0.0"
port = 8000

# Directory served over HTTP.
root = "."
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.foundation_year, 1920);
        assert_eq!(config.data.path, PathBuf::from("wine3.xlsx"));
        assert_eq!(config.data.sheet, "Лист1");
        assert_eq!(config.data.category_column, "Категория");
        assert_eq!(config.template.name, "template.html");
        assert_eq!(config.output.path, PathBuf::from("index.html"));
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "0.0.0.0:8000".parse().unwrap()
        );
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
foundation_year = 1955

[data]
sheet = "Вина"
"#,
        )
        .unwrap();
        assert_eq!(config.foundation_year, 1955);
        assert_eq!(config.data.sheet, "Вина");
        // Defaults preserved
        assert_eq!(config.data.path, PathBuf::from("wine3.xlsx"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[data]\nsheeet = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[server]\nhost = \"0.0.0.0\"\nport = 8000\n").unwrap();
        let overlay: toml::Value = toml::from_str("[server]\nport = 9000\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["server"]["port"].as_integer(), Some(9000));
        assert_eq!(merged["server"]["host"].as_str(), Some("0.0.0.0"));
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml"), Overrides::default()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[output]\npath = \"site/index.html\"\n").unwrap();

        let config = load_config(&path, Overrides::default()).unwrap();
        assert_eq!(config.output.path, PathBuf::from("site/index.html"));
        assert_eq!(config.foundation_year, 1920);
    }

    #[test]
    fn overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[data]\nsheet = \"Вина\"\n[server]\nport = 9000\n").unwrap();

        let overrides = Overrides {
            sheet: Some("Лист2".into()),
            data_path: Some("wine.xlsx".into()),
            port: Some(8080),
            ..Overrides::default()
        };
        let config = load_config(&path, overrides).unwrap();
        assert_eq!(config.data.sheet, "Лист2");
        assert_eq!(config.data.path, PathBuf::from("wine.xlsx"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "foundation_year = \n").unwrap();
        assert!(matches!(
            load_config(&path, Overrides::default()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = SiteConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.server.host = "not an address".into();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.data.category_column.clear();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.template.name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_sentinel_disables_missing_values() {
        let mut data = DataConfig::default();
        assert_eq!(data.load_options().missing_sentinel.as_deref(), Some("Nan"));
        data.missing_sentinel.clear();
        assert_eq!(data.load_options().missing_sentinel, None);
    }
}
