use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    /// Load `~/.edubot/config.toml`, writing a default file on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let edubot_dir = home.join(".edubot");

        if !edubot_dir.exists() {
            fs::create_dir_all(&edubot_dir).context("Failed to create .edubot directory")?;
        }

        Self::load_or_init_at(&edubot_dir.join("config.toml"))
    }

    pub fn load_or_init_at(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.to_path_buf();
            config
        } else {
            let config = Self {
                config_path: config_path.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    /// Config rendered for display, with the API key masked.
    pub fn redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if let Some(key) = shown.model.api_key.as_mut() {
            *key = "[REDACTED]".into();
        }
        toml::to_string_pretty(&shown).context("Failed to serialize config")
    }
}
