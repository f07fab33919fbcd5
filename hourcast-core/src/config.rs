use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{
    DistanceUnit, Position, ambient::LightningTimings, poller::PollerConfig,
    provider::openweather::DEFAULT_BASE_URL,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "HOURCAST_API_KEY";

/// Timer periods, in milliseconds on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub tick_ms: u64,
    pub poll_secs: u64,
    pub welcome_ms: u64,
    pub flash_ms: u64,
    pub lightning_min_ms: u64,
    pub lightning_max_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            poll_secs: 300,
            welcome_ms: 1_000,
            flash_ms: 200,
            lightning_min_ms: 5_000,
            lightning_max_ms: 10_000,
        }
    }
}

impl Timings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn poll(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }

    pub fn welcome(&self) -> Duration {
        Duration::from_millis(self.welcome_ms)
    }

    pub fn lightning(&self) -> LightningTimings {
        LightningTimings {
            min_period: Duration::from_millis(self.lightning_min_ms.max(1)),
            max_period: Duration::from_millis(self.lightning_max_ms.max(1)),
            flash: Duration::from_millis(self.flash_ms),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// geolocate = true
/// distance_unit = "miles"
///
/// [fallback]
/// latitude = 28.6139
/// longitude = 77.209
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Try an IP lookup for the position before using `fallback`.
    pub geolocate: bool,
    pub distance_unit: DistanceUnit,
    pub fallback: Position,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            geolocate: true,
            distance_unit: DistanceUnit::default(),
            fallback: Position::default(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or defaults if it doesn't exist yet, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_stored()?;
        cfg.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Load only what is on disk. Use this before saving, so an
    /// environment-only key is never written back.
    pub fn load_stored() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "hourcast", "hourcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// A non-empty override replaces the stored key.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Returns the API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            fallback: self.fallback,
            period: self.timings.poll(),
        }
    }
}
