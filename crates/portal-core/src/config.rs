//! Portal configuration: link catalog, weather location and storage path.
//!
//! Loaded from TOML. `PORTAL_CONFIG` points at an explicit file; otherwise
//! `portal.toml` under the OS config directory is used when present, and the
//! built-in catalog when not.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, LinkItem, Section};
use crate::weather::{DEFAULT_ENDPOINT, WeatherLocation};

pub const APP_DIR_NAME: &str = "accounting-portal";
pub const CONFIG_FILE_NAME: &str = "portal.toml";
pub const STORE_FILE_NAME: &str = "portal-store.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("No suitable data directory available for the portal store")]
    NoDataDir,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub endpoint: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let location = WeatherLocation::default();
        Self {
            enabled: true,
            latitude: location.latitude,
            longitude: location.longitude,
            label: location.label,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl WeatherConfig {
    pub fn location(&self) -> WeatherLocation {
        WeatherLocation {
            latitude: self.latitude,
            longitude: self.longitude,
            label: self.label.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub links: Vec<LinkItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub weather: WeatherConfig,
    pub storage: StorageConfig,
    pub sections: Vec<SectionConfig>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            storage: StorageConfig::default(),
            sections: default_sections(),
        }
    }
}

impl PortalConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Resolve the config file from the environment and load it.
    pub fn discover() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                tracing::info!("loading config from {}", path.display());
                Self::load(&path)?
            }
            Some(path) if std::env::var_os("PORTAL_CONFIG").is_some() => {
                return Err(ConfigError::Read {
                    path,
                    source: std::io::ErrorKind::NotFound.into(),
                });
            }
            _ => {
                tracing::info!("no config file found; using built-in catalog");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `PORTAL_DATA_DIR` and `PORTAL_WEATHER` overrides.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("PORTAL_DATA_DIR").filter(|dir| !dir.is_empty()) {
            self.storage.path = Some(PathBuf::from(dir).join(STORE_FILE_NAME));
        }
        if let Some(flag) = var("PORTAL_WEATHER") {
            let flag = flag.trim().to_ascii_lowercase();
            self.weather.enabled = !matches!(flag.as_str(), "0" | "off" | "false" | "no");
        }
    }

    /// Where the board store lives.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        let dirs = BaseDirs::new().ok_or(ConfigError::NoDataDir)?;
        Ok(dirs.data_dir().join(APP_DIR_NAME).join(STORE_FILE_NAME))
    }

    /// The configured board, before any saved state is applied.
    pub fn catalog(&self) -> Board {
        Board::new(
            self.sections
                .iter()
                .map(|section| {
                    Section::new(
                        section.id.clone(),
                        section.title.clone(),
                        section.links.clone(),
                    )
                })
                .collect(),
        )
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PORTAL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| {
        dirs.config_dir()
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}

fn default_sections() -> Vec<SectionConfig> {
    let link = |href: &str, label: &str, icon: &str| {
        LinkItem::new(href, label).icon(icon).new_tab(true)
    };

    vec![
        SectionConfig {
            id: "accounting".into(),
            title: "会計システム".into(),
            links: vec![
                link("https://www.freee.co.jp/", "会計freee", "calculator"),
                link("https://biz.moneyforward.com/", "マネーフォワード", "wallet"),
                link("https://www.yayoi-kk.co.jp/", "弥生会計", "book"),
            ],
        },
        SectionConfig {
            id: "tax".into(),
            title: "税務・申告".into(),
            links: vec![
                link("https://www.nta.go.jp/", "国税庁", "landmark"),
                link("https://www.e-tax.nta.go.jp/", "e-Tax", "file"),
                link("https://www.eltax.lta.go.jp/", "eLTAX", "file"),
            ],
        },
        SectionConfig {
            id: "banking".into(),
            title: "銀行・決済".into(),
            links: vec![
                link("https://www.smbc.co.jp/", "三井住友銀行", "bank"),
                link("https://www.bk.mufg.jp/", "三菱UFJ銀行", "bank"),
                link("https://www.mizuhobank.co.jp/", "みずほ銀行", "bank"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_osaka() {
        let config = PortalConfig::default();
        assert!(config.weather.enabled);
        assert_eq!(config.weather.location(), WeatherLocation::default());
        assert_eq!(config.catalog().sections().len(), 3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PortalConfig::from_toml(
            r#"
            [weather]
            label = "東京"
            latitude = 35.68
            longitude = 139.69

            [[sections]]
            id = "hr"
            title = "人事"

            [[sections.links]]
            href = "https://hr.example/"
            label = "勤怠"
            new_tab = true
            "#,
        )
        .unwrap();

        assert_eq!(config.weather.label, "東京");
        assert_eq!(config.weather.endpoint, DEFAULT_ENDPOINT);
        assert!(config.weather.enabled);
        assert_eq!(config.sections.len(), 1);

        let board = config.catalog();
        let link = board.find_link("https://hr.example/").unwrap();
        assert_eq!(link.label, "勤怠");
        assert!(link.new_tab);
        assert_eq!(link.icon, None);
    }

    #[test]
    fn env_overrides_storage_and_weather() {
        let mut config = PortalConfig::default();
        config.apply_env(|key| match key {
            "PORTAL_DATA_DIR" => Some("/tmp/portal".to_string()),
            "PORTAL_WEATHER" => Some("Off".to_string()),
            _ => None,
        });

        assert!(!config.weather.enabled);
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/tmp/portal").join(STORE_FILE_NAME)
        );
    }

    #[test]
    fn weather_flag_other_values_keep_it_enabled() {
        let mut config = PortalConfig::default();
        config.apply_env(|key| (key == "PORTAL_WEATHER").then(|| "1".to_string()));
        assert!(config.weather.enabled);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[weather\nlabel = 1").unwrap();

        let err = PortalConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
