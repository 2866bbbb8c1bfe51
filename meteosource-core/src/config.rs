use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "METEOSOURCE_API_KEY";

pub const DEFAULT_HOST: &str = "https://www.meteosource.com";

/// Meteosource subscription tier; part of every endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Startup,
    Standard,
    Flexi,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Startup => "startup",
            Tier::Standard => "standard",
            Tier::Flexi => "flexi",
        }
    }

    pub const fn all() -> &'static [Tier] {
        &[Tier::Free, Tier::Startup, Tier::Standard, Tier::Flexi]
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Tier {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "free" => Ok(Tier::Free),
            "startup" => Ok(Tier::Startup),
            "standard" => Ok(Tier::Standard),
            "flexi" => Ok(Tier::Flexi),
            _ => Err(anyhow!(
                "Unknown tier '{value}'. Supported tiers: free, startup, standard, flexi."
            )),
        }
    }
}

/// Immutable settings handed to the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub tier: Tier,
    pub host: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, tier: Tier) -> Self {
        Self {
            api_key: api_key.into(),
            tier,
            host: DEFAULT_HOST.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// tier = "flexi"
/// timezone = "Europe/Prague"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub tier: Option<String>,

    /// Overrides [`DEFAULT_HOST`].
    pub host: Option<String>,

    /// Default IANA timezone for presented dates.
    pub timezone: Option<String>,
    pub units: Option<String>,
    pub language: Option<String>,
}

impl Config {
    /// Return the configured tier as a strongly-typed [`Tier`].
    pub fn tier(&self) -> Result<Tier> {
        let s = self.tier.as_ref().ok_or_else(|| {
            anyhow!(
                "No tier configured.\n\
                 Hint: run `meteosource configure` first."
            )
        })?;

        Tier::try_from(s.as_str())
    }

    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = Some(tier.as_str().to_string());
    }

    /// API key, preferring the environment over the stored value.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env: Option<String>) -> Option<String> {
        env.filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn timezone_or_default(&self) -> &str {
        self.timezone.as_deref().unwrap_or("UTC")
    }

    /// Build transport settings, failing with a hint if credentials are missing.
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn client_config_with_env(&self, env: Option<String>) -> Result<ClientConfig> {
        let api_key = self.api_key_with_env(env).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `meteosource configure` or set {API_KEY_ENV}."
            )
        })?;
        let tier = self.tier()?;

        let mut client = ClientConfig::new(api_key, tier);
        if let Some(host) = &self.host {
            client.host = host.trim_end_matches('/').to_string();
        }
        Ok(client)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
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
        let dirs = ProjectDirs::from("com", "meteosource", "meteosource-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
