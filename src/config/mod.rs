use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// How long a hold blocks inventory before the sweeper expires it.
    pub hold_ttl_minutes: i64,
    /// Sweep cadence for expiring holds and completing past-checkout stays.
    pub sweep_interval_secs: u64,
    /// Cancelling at least this many days before check-in is free.
    pub free_cancellation_days: i64,
    /// Fee charged on later cancellations, percent of the booking total.
    pub late_cancellation_fee_pct: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettlementConfig {
    /// Platform's cut of the booking total, percent.
    pub platform_fee_pct: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub auth_token: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("booking.hold_ttl_minutes", 10)?
            .set_default("booking.sweep_interval_secs", 60)?
            .set_default("booking.free_cancellation_days", 7)?
            .set_default("booking.late_cancellation_fee_pct", 20)?
            .set_default("settlement.platform_fee_pct", 12)?
            .set_default("stripe.enabled", false)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with QBOOKING__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("QBOOKING").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_ttl_minutes: 10,
            sweep_interval_secs: 60,
            free_cancellation_days: 7,
            late_cancellation_fee_pct: 20,
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            platform_fee_pct: 12,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://qbooking.db".to_string(),
                max_connections: 10,
            },
            booking: BookingConfig::default(),
            settlement: SettlementConfig::default(),
            stripe: StripeConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}
