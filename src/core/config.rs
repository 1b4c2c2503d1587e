use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Unit in which an upstream endpoint reports monetary values.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitScale {
    Units,
    Thousands,
    Millions,
    Cents,
}

impl UnitScale {
    /// Converts an upstream value into whole units of the local currency.
    pub fn to_local_currency(self, value: f64) -> f64 {
        match self {
            UnitScale::Units => value,
            UnitScale::Thousands => value * 1_000.0,
            UnitScale::Millions => value * 1_000_000.0,
            UnitScale::Cents => value / 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IbgeProviderConfig {
    pub base_url: String,
    pub total_endpoint: String,
    pub per_capita_endpoint: String,
    pub total_unit: UnitScale,
    pub per_capita_unit: UnitScale,
}

impl Default for IbgeProviderConfig {
    fn default() -> Self {
        IbgeProviderConfig {
            base_url: "https://servicodados.ibge.gov.br".to_string(),
            total_endpoint: "/api/v3/agregados/5938/variaveis/37?localidades=N1[all]".to_string(),
            per_capita_endpoint: "/api/v3/agregados/5938/variaveis/513?localidades=N1[all]"
                .to_string(),
            // Variable 37 is published in thousands of BRL, variable 513 in BRL.
            total_unit: UnitScale::Thousands,
            per_capita_unit: UnitScale::Units,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AwesomeApiProviderConfig {
    pub base_url: String,
    pub currency_pair: String,
    pub quote_limit: u32,
}

impl Default for AwesomeApiProviderConfig {
    fn default() -> Self {
        AwesomeApiProviderConfig {
            base_url: "https://economia.awesomeapi.com.br".to_string(),
            currency_pair: "USD-BRL".to_string(),
            quote_limit: 366,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ibge: IbgeProviderConfig,
    pub awesome_api: AwesomeApiProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReloadConfig {
    pub auto_retry: bool,
    pub retry_delay_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        ReloadConfig {
            auto_retry: true,
            retry_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub http: HttpConfig,
    pub reload: ReloadConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults
    /// when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "pibx", "pibx")
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
