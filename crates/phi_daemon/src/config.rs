use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use phi_core::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DATA_DIR_NAME: &str = ".phi";

/// Returns the ~/.phi directory, creating it if needed.
///
/// Falls back to `./.phi` when there is no home directory or it is not
/// writable. Fails only when the fallback cannot be created either.
pub fn phi_data_dir() -> Result<PathBuf> {
    data_dir_in(dirs::home_dir(), Path::new(DATA_DIR_NAME))
}

fn data_dir_in(home: Option<PathBuf>, fallback: &Path) -> Result<PathBuf> {
    if let Some(home) = home {
        let path = home.join(DATA_DIR_NAME);
        match fs::create_dir_all(&path) {
            Ok(()) => return Ok(path),
            Err(e) => warn!(
                error = %e,
                path = %path.display(),
                fallback = %fallback.display(),
                "Data directory not writable, using fallback"
            ),
        }
    } else {
        warn!(fallback = %fallback.display(), "No home directory, using fallback");
    }

    fs::create_dir_all(fallback)
        .with_context(|| format!("creating data directory {}", fallback.display()))?;
    Ok(fallback.to_path_buf())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One human-readable block per snapshot
    #[default]
    Text,
    /// One JSON object per line per snapshot
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(phi_data_dir()?.join("config.toml"))
    }

    /// Load the default config file, writing defaults on first use.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            let config = Config::default();
            config.save_to(&path)?;
            info!(path = %path.display(), "Wrote default configuration");
            return Ok(config);
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .simulation
            .validate()
            .with_context(|| format!("invalid [simulation] in {}", path.display()))?;
        Ok(config)
    }

    /// Write the default configuration to `path`.
    ///
    /// An existing file is kept unless `overwrite` is set.
    pub fn write_default(path: &Path, overwrite: bool) -> Result<()> {
        if path.exists() {
            if !overwrite {
                bail!(
                    "config {} already exists (use --force to replace it)",
                    path.display()
                );
            }
            warn!(path = %path.display(), "Replacing existing configuration");
        }
        Config::default().save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml = self.to_toml()?;
        fs::write(path, toml).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("stage_interval_ms = 500"), "{text}");
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("phi-{name}-{}", std::process::id()))
    }

    #[test]
    fn test_data_dir_under_home() {
        let home = scratch("home");
        let dir = data_dir_in(Some(home.clone()), &scratch("unused")).unwrap();
        assert_eq!(dir, home.join(DATA_DIR_NAME));
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(&home);
    }

    #[test]
    fn test_data_dir_fallback_failure_is_reported() {
        // A regular file where a directory is expected makes both paths fail
        let blocker = scratch("blocker");
        fs::write(&blocker, "").unwrap();
        let result = data_dir_in(Some(blocker.clone()), &blocker.join("fallback"));
        let _ = fs::remove_file(&blocker);
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("creating data directory"), "{err:#}");
    }

    #[test]
    fn test_data_dir_without_home_uses_fallback() {
        let fallback = scratch("fallback");
        let dir = data_dir_in(None, &fallback).unwrap();
        assert_eq!(dir, fallback);
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(&fallback);
    }

    #[test]
    fn test_write_default_keeps_existing_file() {
        let path = scratch("existing.toml");
        fs::write(&path, "[simulation]\nstage_interval_ms = 250\n").unwrap();

        assert!(Config::write_default(&path, false).is_err());
        assert_eq!(Config::load_from(&path).unwrap().simulation.stage_interval_ms, 250);

        Config::write_default(&path, true).unwrap();
        let replaced = Config::load_from(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(replaced, Config::default());
    }

    #[test]
    fn test_zero_interval_file_rejected() {
        let path = std::env::temp_dir().join(format!("phi-config-{}.toml", std::process::id()));
        fs::write(&path, "[simulation]\nstage_interval_ms = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(format!("{err:#}").contains("positive"), "{err:#}");
    }
}
