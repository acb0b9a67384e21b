use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Short-term forecast endpoint of the provider.
pub const DEFAULT_BASE_URL: &str =
    "https://apis.data.go.kr/1360000/VilageFcstInfoService_2.0/getVilageFcst";

/// Forecast grid cell, in provider grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub nx: i32,
    pub ny: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self { nx: 120, ny: 60 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// service_key = "..."
/// num_of_rows = 10000
///
/// [grid]
/// nx = 120
/// ny = 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service_key: Option<String>,
    pub base_url: String,
    /// Row cap of a single fetch.
    pub num_of_rows: u32,
    pub timeout_secs: u64,
    pub grid: Grid,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            num_of_rows: 10_000,
            timeout_secs: 10,
            grid: Grid::default(),
        }
    }
}

impl Config {
    /// Returns the provider service key, or an error with a hint if missing.
    pub fn service_key(&self) -> Result<&str> {
        self.service_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No service key configured.\n\
                 Hint: run `forecast configure` and enter your service key first."
            )
        })
    }

    pub fn set_service_key(&mut self, key: String) {
        self.service_key = Some(key);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
