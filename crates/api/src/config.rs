//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::Money;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Configuration shared by both services, with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `ORDER_PORT` / `PAYMENT_PORT`: listen ports (default: `8080` / `8081`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on the in-memory store
/// - `PAYMENT_QUEUE_URL`: where the order service publishes payment requests
/// - `ORDER_CALLBACK_URL`: where the payment service reports outcomes
/// - `QUEUE_CAPACITY`: slots in each service's queue (default: `10000`)
/// - `PAYMENT_LIMIT_CENTS`: highest accepted payment (default: `100000`)
/// - `MAX_IN_FLIGHT`: concurrent tasks per consumer loop (default: no cap)
/// - `HTTP_TIMEOUT_SECS`: outbound request timeout (default: `30`)
/// - `DB_MAX_CONNECTIONS`: pool size (default: `100`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub order_port: u16,
    pub payment_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub payment_queue_url: String,
    pub order_callback_url: String,
    pub queue_capacity: usize,
    pub payment_limit: Money,
    pub max_in_flight: Option<usize>,
    pub http_timeout: Duration,
    pub db_max_connections: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| Parsed(lookup(key));

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            order_port: parsed("ORDER_PORT").get().unwrap_or(defaults.order_port),
            payment_port: parsed("PAYMENT_PORT").get().unwrap_or(defaults.payment_port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            payment_queue_url: lookup("PAYMENT_QUEUE_URL").unwrap_or(defaults.payment_queue_url),
            order_callback_url: lookup("ORDER_CALLBACK_URL")
                .unwrap_or(defaults.order_callback_url),
            queue_capacity: parsed("QUEUE_CAPACITY").get().unwrap_or(defaults.queue_capacity),
            payment_limit: parsed("PAYMENT_LIMIT_CENTS")
                .get()
                .map(Money::from_cents)
                .unwrap_or(defaults.payment_limit),
            max_in_flight: parsed("MAX_IN_FLIGHT").get().filter(|max: &usize| *max > 0),
            http_timeout: parsed("HTTP_TIMEOUT_SECS")
                .get()
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            db_max_connections: parsed("DB_MAX_CONNECTIONS")
                .get()
                .unwrap_or(defaults.db_max_connections),
        }
    }

    /// Returns the order service's `"host:port"` bind address.
    pub fn order_addr(&self) -> String {
        format!("{}:{}", self.host, self.order_port)
    }

    /// Returns the payment service's `"host:port"` bind address.
    pub fn payment_addr(&self) -> String {
        format!("{}:{}", self.host, self.payment_port)
    }
}

/// Raw variable value, parsed on demand into whatever type the field needs.
struct Parsed(Option<String>);

impl Parsed {
    fn get<T: std::str::FromStr>(self) -> Option<T> {
        self.0.and_then(|v| v.trim().parse().ok())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            order_port: 8080,
            payment_port: 8081,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            payment_queue_url: "http://127.0.0.1:8081/payment/new_payment".to_string(),
            order_callback_url: "http://127.0.0.1:8080/order/payment_callback".to_string(),
            queue_capacity: common::queue::DEFAULT_CAPACITY,
            payment_limit: payments::DEFAULT_PAYMENT_LIMIT,
            max_in_flight: None,
            http_timeout: Duration::from_secs(30),
            db_max_connections: 100,
        }
    }
}
