//! Kernel configuration via `zbot.toml`
//!
//! The file lives in the working directory. On first start a commented
//! default is written; edit it and restart to change which packages are
//! searched and which modules are initialized.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zbot_core::{Error, Result};

/// Config file name placed in the working directory.
pub const CONFIG_FILE_NAME: &str = "zbot.toml";

/// Package the shipped modules are registered under.
pub const DEFAULT_PACKAGE: &str = "zbot";

/// Kernel configuration loaded from `zbot.toml`.
///
/// # Example
///
/// ```toml
/// packages = ["zbot"]
/// mods = ["basic", "log"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Package prefixes short module names are resolved against, in order.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    /// Modules loaded and initialized on start.
    #[serde(default = "default_mods")]
    pub mods: Vec<String>,
}

fn default_packages() -> Vec<String> {
    vec![DEFAULT_PACKAGE.to_string()]
}

fn default_mods() -> Vec<String> {
    vec!["basic".to_string(), "log".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            mods: default_mods(),
        }
    }
}

impl Config {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# zbot kernel configuration
#
# Package prefixes that short module names are looked up under.
packages = ["zbot"]

# Modules loaded and initialized on start.
mods = ["basic", "log"]
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::ConfigError(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
