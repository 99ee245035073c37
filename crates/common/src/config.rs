//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// osu! API and OAuth configuration.
    pub osu: OsuConfig,
    /// Queue maintenance sweep configuration.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// osu! API credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct OsuConfig {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Legacy v1 API key (beatmap lookups).
    pub api_key: String,
    /// Base URL of the osu! website and API.
    #[serde(default = "default_osu_base")]
    pub api_base: String,
}

/// Thresholds for the daily queue maintenance sweep, all in days except
/// the interval itself.
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Close an open queue after this many days without owner action.
    #[serde(default = "default_auto_close_days")]
    pub auto_close_days: i64,
    /// Archive an open queue whose owner never responds for this long.
    #[serde(default = "default_no_response_days")]
    pub no_response_days: i64,
    /// Archive a queue that received no new requests for this long.
    #[serde(default = "default_dead_days")]
    pub dead_days: i64,
    /// Newly created or reactivated queues are exempt for this long.
    #[serde(default = "default_leniency_days")]
    pub leniency_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            auto_close_days: default_auto_close_days(),
            no_response_days: default_no_response_days(),
            dead_days: default_dead_days(),
            leniency_days: default_leniency_days(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_osu_base() -> String {
    "https://osu.ppy.sh".to_string()
}

const fn default_sweep_interval() -> u64 {
    86400
}

const fn default_auto_close_days() -> i64 {
    21
}

const fn default_no_response_days() -> i64 {
    60
}

const fn default_dead_days() -> i64 {
    150
}

const fn default_leniency_days() -> i64 {
    14
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `OSUMOD_ENV`)
    /// 3. Environment variables with `OSUMOD_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("OSUMOD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("OSUMOD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_defaults() {
        let m = MaintenanceConfig::default();
        assert_eq!(m.sweep_interval_secs, 86400);
        assert_eq!(m.auto_close_days, 21);
        assert_eq!(m.no_response_days, 60);
        assert_eq!(m.dead_days, 150);
        assert_eq!(m.leniency_days, 14);
    }
}
