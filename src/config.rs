use std::path::Path;

use crate::ai::{BotConfig, BotLevel};
use crate::error::ConfigError;
use crate::game::{BoardConfig, CONNECT};
use crate::orchestrator::OnlineConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub bot: BotConfig,
    pub online: OnlineConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.width == 0 || self.board.height == 0 {
            return Err(ConfigError::Validation(
                "board.width and board.height must be > 0".into(),
            ));
        }
        if self.board.width < CONNECT && self.board.height < CONNECT {
            return Err(ConfigError::Validation(format!(
                "board must be at least {CONNECT} wide or {CONNECT} high"
            )));
        }

        for level in BotLevel::ALL {
            let profile = self.bot.profile(level);
            let key = level.name().to_lowercase();
            if profile.depth == 0 {
                return Err(ConfigError::Validation(format!(
                    "bot.{key}.depth must be >= 1"
                )));
            }
            if !profile.tolerance.is_finite() || profile.tolerance < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "bot.{key}.tolerance must be a finite value >= 0"
                )));
            }
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
    }
}
