use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::ScoutConfig;

/// Loads the wvscout configuration.
pub struct ConfigLoader {
    config: ScoutConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > WVSCOUT_CONFIG env > ~/.wvscout/wvscout.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("WVSCOUT_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wvscout")
            .join("wvscout.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> wvscout_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw, &config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            ScoutConfig::default()
        };

        let config = Self::apply_env_overrides(config);
        Self::check(&config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Build a loader from an in-memory TOML document.
    pub fn from_toml(raw: &str) -> wvscout_core::Result<Self> {
        let config_path = PathBuf::from("<inline>");
        let config = Self::parse(raw, &config_path)?;
        Self::check(&config)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    fn parse(raw: &str, path: &Path) -> wvscout_core::Result<ScoutConfig> {
        toml::from_str::<ScoutConfig>(raw).map_err(|e| {
            wvscout_core::ScoutError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Validate config: log warnings, fail on errors.
    pub fn check(config: &ScoutConfig) -> wvscout_core::Result<()> {
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
                Ok(())
            }
            Err(e) => Err(wvscout_core::ScoutError::Config(e)),
        }
    }

    /// Get a snapshot of the current config.
    pub fn get(&self) -> ScoutConfig {
        self.config.clone()
    }

    /// Path the config was loaded from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (WVSCOUT_DEVICE_SERIAL, WVSCOUT_DEVICE_SOCKET, etc.)
    pub fn apply_env_overrides(config: ScoutConfig) -> ScoutConfig {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Split out so tests do not
    /// have to mutate the process environment.
    pub fn apply_overrides(
        mut config: ScoutConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ScoutConfig {
        // Config file wins over ANDROID_SERIAL, the explicit var wins over both.
        if let Some(v) = lookup("WVSCOUT_DEVICE_SERIAL") {
            config.device.serial = Some(v);
        } else if config.device.serial.is_none()
            && let Some(v) = lookup("ANDROID_SERIAL")
        {
            config.device.serial = Some(v);
        }
        if let Some(v) = lookup("WVSCOUT_DEVICE_SOCKET") {
            config.discovery.device_socket = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("WVSCOUT_DEVTOOLS_PORT") {
            match v.parse::<u16>() {
                Ok(port) => config.discovery.devtools_port = Some(port),
                Err(_) => warn!(value = %v, "ignoring invalid WVSCOUT_DEVTOOLS_PORT"),
            }
        }
        if let Some(v) = lookup("WVSCOUT_LOG_LEVEL") {
            config.logging.level = v;
        }
        config
    }
}
