// SPDX-License-Identifier: Apache-2.0

use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) log: LogConfig,
    #[serde(default)]
    pub(crate) plugin: PluginConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogConfig {
    #[serde(default = "default_log_level")]
    pub(crate) level: String,
    /// Log to this file instead of STDERR.
    #[serde(default)]
    pub(crate) file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogConfig {
    pub(crate) fn level_filter(&self) -> Result<LevelFilter, CliError> {
        Ok(LevelFilter::from_str(&self.level)?)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct PluginConfig {
    /// Searched for the IPAM plugin after the `CNI_PATH` folders.
    #[serde(default)]
    pub(crate) extra_dirs: Vec<PathBuf>,
}

impl Config {
    pub(crate) const DEFAULT_CONFIG_PATH: &'static str =
        "/etc/cni/cni-ipam-shim.conf";
    pub(crate) const CONFIG_PATH_ENV: &'static str = "CNI_IPAM_SHIM_CONF";

    pub(crate) fn load(path: &str) -> Result<Self, CliError> {
        let path = std::path::Path::new(path);
        if !path.exists() {
            return Ok(Config::default());
        }
        let mut fd = std::fs::File::open(path)?;
        let mut content = String::new();
        fd.read_to_string(&mut content)?;
        Self::from_toml(&content).map_err(|e| {
            CliError::from(format!(
                "Failed to read configuration from {}: {e}",
                path.display()
            ))
        })
    }

    pub(crate) fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Config = toml::from_str(content)?;
        config.log.level_filter()?;
        Ok(config)
    }
}
