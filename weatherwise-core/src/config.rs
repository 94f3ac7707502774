use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::units::TemperatureUnit;

/// External services that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    OpenWeather,
    Gemini,
    Supabase,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::OpenWeather => "openweather",
            ServiceId::Gemini => "gemini",
            ServiceId::Supabase => "supabase",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::OpenWeather, ServiceId::Gemini, ServiceId::Supabase]
    }

    /// Whether the service also needs a project URL besides the key.
    pub fn requires_base_url(&self) -> bool {
        matches!(self, ServiceId::Supabase)
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ServiceId::OpenWeather),
            "gemini" | "google" => Ok(ServiceId::Gemini),
            "supabase" => Ok(ServiceId::Supabase),
            _ => Err(anyhow!(
                "Unknown service '{value}'. Supported services: openweather, gemini, supabase."
            )),
        }
    }
}

/// Credentials and endpoint overrides for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,

    /// Supabase project URL, or an alternative endpoint for the other services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name for the generative-AI service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Stable anonymous user id, generated on first use.
    pub user_id: Option<String>,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Example TOML:
    /// [services.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

impl Config {
    pub fn service(&self, id: ServiceId) -> Option<&ServiceConfig> {
        self.services.get(id.as_str())
    }

    /// Returns API key for a service, if present.
    pub fn api_key(&self, id: ServiceId) -> Option<&str> {
        self.service(id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_configured(&self, id: ServiceId) -> bool {
        match self.service(id) {
            Some(cfg) => !id.requires_base_url() || cfg.base_url.is_some(),
            None => false,
        }
    }

    /// Set/replace an API key, keeping any endpoint or model already stored.
    pub fn upsert_api_key(&mut self, id: ServiceId, api_key: String) {
        self.services.entry(id.as_str().to_string()).or_default().api_key = api_key;
    }

    pub fn set_base_url(&mut self, id: ServiceId, base_url: String) {
        self.services.entry(id.as_str().to_string()).or_default().base_url = Some(base_url);
    }

    pub fn set_model(&mut self, id: ServiceId, model: String) {
        self.services.entry(id.as_str().to_string()).or_default().model = Some(model);
    }

    /// The persisted user id, generating (but not saving) one when absent.
    pub fn ensure_user_id(&mut self) -> &str {
        self.user_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .as_str()
    }

    /// Environment credentials take precedence over the file.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENWEATHER_API_KEY") {
            self.upsert_api_key(ServiceId::OpenWeather, key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.upsert_api_key(ServiceId::Gemini, key);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.upsert_api_key(ServiceId::Supabase, key);
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.set_base_url(ServiceId::Supabase, url);
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherwise", "weatherwise")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_id_as_str_roundtrip() {
        for id in ServiceId::all() {
            let parsed = ServiceId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
        assert_eq!(ServiceId::try_from("Google").unwrap(), ServiceId::Gemini);
    }

    #[test]
    fn unknown_service_error() {
        let err = ServiceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn upsert_keeps_base_url_and_model() {
        let mut cfg = Config::default();
        cfg.set_base_url(ServiceId::Supabase, "https://proj.supabase.co".into());
        cfg.upsert_api_key(ServiceId::Supabase, "ANON".into());
        cfg.set_model(ServiceId::Gemini, "gemini-pro".into());
        cfg.upsert_api_key(ServiceId::Gemini, "G".into());

        let supabase = cfg.service(ServiceId::Supabase).unwrap();
        assert_eq!(supabase.api_key, "ANON");
        assert_eq!(supabase.base_url.as_deref(), Some("https://proj.supabase.co"));
        assert_eq!(cfg.service(ServiceId::Gemini).unwrap().model.as_deref(), Some("gemini-pro"));
    }

    #[test]
    fn supabase_needs_url_to_be_configured() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::Supabase, "ANON".into());
        assert!(!cfg.is_configured(ServiceId::Supabase));

        cfg.set_base_url(ServiceId::Supabase, "https://proj.supabase.co".into());
        assert!(cfg.is_configured(ServiceId::Supabase));
        assert!(!cfg.is_configured(ServiceId::OpenWeather));
    }

    #[test]
    fn ensure_user_id_is_stable() {
        let mut cfg = Config::default();
        let first = cfg.ensure_user_id().to_string();
        assert_eq!(first.len(), 36);
        assert_eq!(cfg.ensure_user_id(), first);
    }

    #[test]
    fn overrides_prefer_gemini_over_google_key() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::OpenWeather, "FILE".into());
        cfg.apply_overrides(|key| match key {
            "OPENWEATHER_API_KEY" => Some("ENV".into()),
            "GEMINI_API_KEY" => Some("GEM".into()),
            "GOOGLE_API_KEY" => Some("GOO".into()),
            _ => None,
        });

        assert_eq!(cfg.api_key(ServiceId::OpenWeather), Some("ENV"));
        assert_eq!(cfg.api_key(ServiceId::Gemini), Some("GEM"));
        assert_eq!(cfg.api_key(ServiceId::Supabase), None);
    }

    #[test]
    fn parses_toml() {
        let cfg = Config::from_toml(
            r#"
            user_id = "abc"
            temperature_unit = "F"

            [services.openweather]
            api_key = "OW"

            [services.supabase]
            api_key = "SB"
            base_url = "https://x.supabase.co"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.user_id.as_deref(), Some("abc"));
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.api_key(ServiceId::OpenWeather), Some("OW"));
        assert!(cfg.is_configured(ServiceId::Supabase));
    }
}
