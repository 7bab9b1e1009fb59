use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, info};

const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SourceConfig {
    fn with_url(base_url: &str) -> Self {
        SourceConfig {
            base_url: base_url.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OfficialSourceConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Also request the EUR quote the official source publishes directly.
    #[serde(default = "default_true")]
    pub direct_euro: bool,
}

impl OfficialSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OfficialSourceConfig {
    fn default() -> Self {
        OfficialSourceConfig {
            base_url: "https://ve.dolarapi.com".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            direct_euro: true,
        }
    }
}

fn default_central_bank() -> SourceConfig {
    SourceConfig::with_url("https://api.frankfurter.app")
}

fn default_exchange_rate_api() -> SourceConfig {
    SourceConfig::with_url("https://open.er-api.com")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub official: OfficialSourceConfig,
    #[serde(default = "default_central_bank")]
    pub central_bank: SourceConfig,
    #[serde(default = "default_exchange_rate_api")]
    pub exchange_rate_api: SourceConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            official: OfficialSourceConfig::default(),
            central_bank: default_central_bank(),
            exchange_rate_api: default_exchange_rate_api(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PresenterConfig {
    /// Base URL of the server exposing the rate endpoints.
    pub endpoint: String,
    pub locale: String,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        PresenterConfig {
            endpoint: "http://127.0.0.1:3000".to_string(),
            locale: "es-VE".to_string(),
        }
    }
}

fn default_local_currency() -> String {
    "VES".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_local_currency")]
    pub local_currency: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub presenter: PresenterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            local_currency: default_local_currency(),
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            presenter: PresenterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            info!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "tasa", "tasa")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
local_currency: "ves"
server:
  bind: "127.0.0.1:8080"
providers:
  official:
    base_url: "http://example.com/official"
    timeout_ms: 1500
    direct_euro: false
  central_bank:
    base_url: "http://example.com/ecb"
  exchange_rate_api:
    base_url: "http://example.com/er"
    timeout_ms: 800
presenter:
  endpoint: "http://example.com"
  locale: "en-US"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.local_currency, "ves");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.providers.official.base_url, "http://example.com/official");
        assert_eq!(config.providers.official.timeout(), Duration::from_millis(1500));
        assert!(!config.providers.official.direct_euro);
        assert_eq!(config.providers.central_bank.base_url, "http://example.com/ecb");
        assert_eq!(config.providers.central_bank.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.providers.exchange_rate_api.timeout_ms, 800);
        assert_eq!(config.presenter.locale, "en-US");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let yaml_str = r#"
providers:
  central_bank:
    base_url: "http://example.com/ecb"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.local_currency, "VES");
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.providers.official.base_url, "https://ve.dolarapi.com");
        assert!(config.providers.official.direct_euro);
        assert_eq!(config.providers.central_bank.base_url, "http://example.com/ecb");
        assert_eq!(
            config.providers.exchange_rate_api.base_url,
            "https://open.er-api.com"
        );
        assert_eq!(config.presenter.endpoint, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "local_currency: COP\n")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.local_currency, "COP");

        let missing = AppConfig::load_from_path(file.path().with_extension("missing"));
        assert!(missing.unwrap_err().to_string().contains("Failed to read config file"));
        Ok(())
    }
}
