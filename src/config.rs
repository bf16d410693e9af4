use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::invoice::CoordinateMap;

pub const DEFAULT_CONFIG_FILE: &str = "geninv.json";

/// Everything the tool needs to know about where things live.
///
/// Relative paths resolve against `base_dir`, which is the directory of the
/// config file when one was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one folder per property.
    pub root_directory: PathBuf,
    /// Display name of a property to its folder under `root_directory`.
    pub property_catalog: BTreeMap<String, String>,
    pub template_path: PathBuf,
    pub ledger_path: PathBuf,
    pub default_tenants_path: PathBuf,
    pub output_directory: PathBuf,
    pub layout: CoordinateMap,

    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("."),
            property_catalog: BTreeMap::new(),
            template_path: PathBuf::from("Invoice Master.pdf"),
            ledger_path: PathBuf::from("properties_data.json"),
            default_tenants_path: PathBuf::from("default_tenants.json"),
            output_directory: PathBuf::from("."),
            layout: CoordinateMap::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Reads `path`; an absent file yields the defaults rooted next to it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Config>(&content).map_err(|e| ConfigError::Malformed {
                path: path.to_path_buf(),
                source: e,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Config::default()
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        config.base_dir = base_dir;
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn root_directory(&self) -> PathBuf {
        self.resolve(&self.root_directory)
    }

    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template_path)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.ledger_path)
    }

    pub fn default_tenants_path(&self) -> PathBuf {
        self.resolve(&self.default_tenants_path)
    }

    pub fn output_directory(&self) -> PathBuf {
        self.resolve(&self.output_directory)
    }

    /// Property names in catalog order.
    pub fn property_names(&self) -> Vec<&str> {
        self.property_catalog.keys().map(String::as_str).collect()
    }
}
