use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub search: SearchConfig,
    pub watchlist: WatchlistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub page_size: u32,
    pub compare_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    pub max_activated: usize,
    pub target_price_percent: u8,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "DEALWATCH_"
            .add_source(Environment::with_prefix("DEALWATCH").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.gateway.base_url).is_err() {
            return Err(ConfigError::Message("Invalid gateway base_url format".into()));
        }

        if self.gateway.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Gateway request_timeout must be greater than 0".into(),
            ));
        }

        // The backend caps search batches at 50 rows per page.
        if !(1..=50).contains(&self.search.page_size) {
            return Err(ConfigError::Message(
                "Search page_size must be between 1 and 50".into(),
            ));
        }

        if !(1..=50).contains(&self.search.compare_limit) {
            return Err(ConfigError::Message(
                "Search compare_limit must be between 1 and 50".into(),
            ));
        }

        if self.watchlist.max_activated == 0 {
            return Err(ConfigError::Message(
                "Watchlist max_activated must be greater than 0".into(),
            ));
        }

        if !(1..=100).contains(&self.watchlist.target_price_percent) {
            return Err(ConfigError::Message(
                "Watchlist target_price_percent must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }
}
