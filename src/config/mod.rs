use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// How the desparsifier fills the gap between two known values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Hold the previous value until the next one arrives.
    #[default]
    Carry,
    /// Interpolate linearly between the two known values.
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_max_sample_rate")]
    pub max_sample_rate: u32,
    #[serde(default = "default_extra_index_channels")]
    pub extra_index_channels: Vec<String>,
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
    #[serde(default)]
    pub fill_mode: FillMode,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_max_sample_rate() -> u32 {
    1000
}
fn default_extra_index_channels() -> Vec<String> {
    vec!["CurrentLap".to_string()]
}
fn default_progress_step() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            max_sample_rate: default_max_sample_rate(),
            extra_index_channels: default_extra_index_channels(),
            progress_step: default_progress_step(),
            fill_mode: FillMode::default(),
        }
    }
}

/// The subset of configuration the datastore engine itself consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    pub max_sample_rate: u32,
    pub extra_index_channels: Vec<String>,
    pub progress_step: u32,
    pub fill_mode: FillMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Config::default().store_options()
    }
}

impl Config {
    /// Return the standard configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".telemstore")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("telemstore.conf")
    }

    /// Return the default path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("telemstore.sqlite")
    }

    /// Load configuration from the standard location, or defaults if absent.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &std::path::Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_sample_rate == 0 {
            return Err(AppError::Config("max_sample_rate must be positive".into()));
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(AppError::Config(
                "progress_step must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            max_sample_rate: self.max_sample_rate,
            extra_index_channels: self.extra_index_channels.clone(),
            progress_step: self.progress_step,
            fill_mode: self.fill_mode,
        }
    }

    /// Write the configuration file (creating the directory) and return its path.
    /// An existing file is left alone.
    pub fn init_file(&self) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let path = Self::config_file();
        if !path.exists() {
            let yaml = serde_yaml::to_string(self)?;
            fs::write(&path, yaml)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.max_sample_rate, 1000);
        assert_eq!(cfg.extra_index_channels, vec!["CurrentLap".to_string()]);
        assert_eq!(cfg.progress_step, 5);
        assert_eq!(cfg.fill_mode, FillMode::Carry);
    }

    #[test]
    fn fill_mode_parses_lowercase() {
        let cfg: Config = serde_yaml::from_str("fill_mode: linear\n").unwrap();
        assert_eq!(cfg.fill_mode, FillMode::Linear);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        fs::write(&path, "max_sample_rate: 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn absent_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.conf")).unwrap();
        assert_eq!(cfg.progress_step, 5);
    }
}
