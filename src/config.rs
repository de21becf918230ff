use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "usd";
// Carts linger for 30 days before the store forgets them.
const DEFAULT_CART_TTL_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_PAYMENT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// SMTP settings for outbound order-confirmation email.
/// Absent configuration means notifications are logged instead of sent.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub smtp_username: String,
    pub smtp_password: String,

    /// Sender address for confirmation mail
    #[validate(email)]
    pub from_email: String,

    /// Store-side recipient of new-order notifications
    #[validate(email)]
    pub order_notification_email: String,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// ISO currency code passed to the payment processor
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Idle session carts are dropped after this many seconds
    #[serde(default = "default_cart_ttl_secs")]
    pub cart_ttl_secs: u64,

    /// Externally reachable base URL, used to build payment callback URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Payment processor API key
    #[validate(length(min = 1))]
    pub payment_secret_key: String,

    /// Payment processor API base URL (overridable for tests)
    #[serde(default = "default_payment_api_base")]
    pub payment_api_base: String,

    /// Timeout for outbound payment processor calls (seconds)
    #[serde(default = "default_payment_timeout_secs")]
    pub payment_timeout_secs: u64,

    /// Shared secret for verifying inbound payment events
    #[validate(length(min = 1))]
    pub payment_webhook_secret: String,

    /// Maximum accepted age of a signed webhook timestamp (seconds)
    #[serde(default = "default_webhook_tolerance_secs")]
    pub payment_webhook_tolerance_secs: u64,

    /// SMTP settings; omit to log notifications instead of sending them
    #[serde(default)]
    #[validate]
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Hosted-checkout success callback. The `{CHECKOUT_SESSION_ID}`
    /// placeholder is substituted by the payment processor on redirect.
    pub fn checkout_success_url(&self) -> String {
        format!(
            "{}/api/v1/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.public_base_url.trim_end_matches('/')
        )
    }

    pub fn checkout_cancel_url(&self) -> String {
        format!(
            "{}/api/v1/checkout/cancel",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/*.toml` files layered with `APP__*`
/// environment variables. Secrets have no defaults and must be provided.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let builder = Config::builder()
        .set_default("database_url", "sqlite://teamstore.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Check for secrets before deserialization to provide a clear error message
    if config.get_string("payment_secret_key").is_err() {
        error!("Payment processor key is not configured. Set APP__PAYMENT_SECRET_KEY.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "payment_secret_key is required but not configured. Set APP__PAYMENT_SECRET_KEY."
                .into(),
        )));
    }
    if config.get_string("payment_webhook_secret").is_err() {
        error!("Webhook signing secret is not configured. Set APP__PAYMENT_WEBHOOK_SECRET.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "payment_webhook_secret is required but not configured. Set APP__PAYMENT_WEBHOOK_SECRET."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("teamstore_api={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_cart_ttl_secs() -> u64 {
    DEFAULT_CART_TTL_SECS
}

fn default_public_base_url() -> String {
    format!("http://localhost:{}", DEFAULT_PORT)
}

fn default_payment_api_base() -> String {
    DEFAULT_PAYMENT_API_BASE.to_string()
}

fn default_payment_timeout_secs() -> u64 {
    DEFAULT_PAYMENT_TIMEOUT_SECS
}

fn default_webhook_tolerance_secs() -> u64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}

fn default_smtp_port() -> u16 {
    587
}
