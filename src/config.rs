use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the shopfloor terminal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopfloorConfig {
    /// Backend (system-of-record) connection settings
    pub backend: BackendConfig,
    /// Process execution settings
    pub process: ProcessConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the shop-floor REST backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessConfig {
    /// Station name the consumption sub-flow reports its closing process
    /// step to. The prototype hard-coded "MainAssembly1"; here it is
    /// deployment configuration.
    pub closing_station: String,
    /// Name recorded on the closing process step
    pub closing_step_name: String,
    /// Inspector identity recorded on raw-material inspections
    pub inspector: String,
    /// Test type recorded on raw-material inspections
    pub visual_test_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON-structured log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ShopfloorConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:5068".to_string(),
                timeout_seconds: 10,
            },
            process: ProcessConfig {
                closing_station: "MainAssembly1".to_string(),
                closing_step_name: "product_01".to_string(),
                inspector: "John Doe".to_string(),
                visual_test_type: "Visual Check".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl ShopfloorConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. shopfloor.toml in the working directory
    /// 3. Environment variables (SHOPFLOOR_BACKEND__BASE_URL, ...)
    pub fn load() -> Result<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&ShopfloorConfig::default())?);

        if Path::new("shopfloor.toml").exists() {
            builder = builder.add_source(File::with_name("shopfloor"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SHOPFLOOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file (used by `shopfloor init`).
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists.
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

static CONFIG: std::sync::LazyLock<Result<ShopfloorConfig, anyhow::Error>> =
    std::sync::LazyLock::new(ShopfloorConfig::load);

/// Global configuration accessor.
pub fn config() -> Result<&'static ShopfloorConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Force configuration loading at startup so bad config fails fast.
pub fn init_config() -> Result<()> {
    config()?;
    Ok(())
}
