//! Fetcher configuration
//!
//! Optional YAML file controlling provider hosts, output templates, HTTP
//! settings, retry and pacing policy, and log output. Every field has a
//! default, so an empty file (or no file) is a valid configuration.

use crate::endpoints::{DEFAULT_DATA_URL, DEFAULT_TRADING_URL};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimitPolicy, RateLimiterConfig};
use crate::pagination::RetryPolicy;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete fetcher configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetcherConfig {
    /// Market data host (bars, news)
    #[serde(default = "default_data_url")]
    pub data_url: String,

    /// Trading API host (calendar)
    #[serde(default = "default_trading_url")]
    pub trading_url: String,

    /// Output path templates
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Header-driven pacing
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            data_url: default_data_url(),
            trading_url: default_trading_url(),
            output: OutputConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            pacing: PacingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_data_url() -> String {
    DEFAULT_DATA_URL.to_string()
}

fn default_trading_url() -> String {
    DEFAULT_TRADING_URL.to_string()
}

impl FetcherConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("data_url", &self.data_url), ("trading_url", &self.trading_url)] {
            url::Url::parse(value)
                .map_err(|e| Error::invalid_value(field, format!("'{value}': {e}")))?;
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::invalid_value("http.timeout_secs", "must be positive"));
        }
        if self.http.requests_per_minute == Some(0) {
            return Err(Error::invalid_value(
                "http.requests_per_minute",
                "must be positive (omit it to disable throttling)",
            ));
        }

        let fraction = self.pacing.replenish_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::invalid_value(
                "pacing.replenish_fraction",
                format!("{fraction} is outside (0, 1]"),
            ));
        }

        for (field, secs) in [
            ("retry.rate_limit_delay_secs", self.retry.rate_limit_delay_secs),
            ("retry.max_rate_limit_delay_secs", self.retry.max_rate_limit_delay_secs),
            ("retry.network_backoff_secs", self.retry.network_backoff_secs),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(Error::invalid_value(
                    field,
                    format!("{secs} is not a valid delay (negative, not finite or too large)"),
                ));
            }
        }
        if self.retry.max_rate_limit_delay_secs < self.retry.rate_limit_delay_secs {
            return Err(Error::invalid_value(
                "retry.max_rate_limit_delay_secs",
                "must not be smaller than retry.rate_limit_delay_secs",
            ));
        }

        for (field, template) in self.output.templates() {
            if template.trim().is_empty() {
                return Err(Error::invalid_value(field, "must not be empty"));
            }
        }

        Ok(())
    }

    /// Retry policy described by `retry`
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.retry;
        RetryPolicy::default()
            .with_rate_limit_backoff(
                retry.rate_limit_backoff,
                delay_from_secs(retry.rate_limit_delay_secs),
            )
            .with_max_retry_delay(delay_from_secs(retry.max_rate_limit_delay_secs))
            .with_max_rate_limit_retries(retry.max_rate_limit_retries)
            .with_network_retries(
                retry.max_network_retries,
                delay_from_secs(retry.network_backoff_secs),
            )
    }

    /// Pacing policy described by `pacing`
    pub fn pacing_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.pacing.replenish_fraction)
    }

    /// HTTP client settings described by `http` (no credentials attached)
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder =
            HttpClientConfig::builder().timeout(Duration::from_secs(self.http.timeout_secs));
        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        if let Some(rpm) = self.http.requests_per_minute {
            builder = builder.rate_limit(RateLimiterConfig::per_minute(rpm));
        }
        builder.build()
    }
}

/// Seconds as a delay; values `validate` rejects saturate instead of panicking
fn delay_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

// ============================================================================
// Sections
// ============================================================================

/// Output path templates; `{}` is replaced with the table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Bars template (one file per symbol)
    #[serde(default)]
    pub bars: Option<String>,

    /// News template
    #[serde(default)]
    pub news: Option<String>,

    /// Calendar template
    #[serde(default)]
    pub calendar: Option<String>,
}

impl OutputConfig {
    /// Configured template for the endpoint `name`
    pub fn template_for(&self, name: &str) -> Option<&str> {
        match name {
            "bars" => self.bars.as_deref(),
            "news" => self.news.as_deref(),
            "calendar" => self.calendar.as_deref(),
            _ => None,
        }
    }

    fn templates(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("output.bars", self.bars.as_deref()),
            ("output.news", self.news.as_deref()),
            ("output.calendar", self.calendar.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, template)| template.map(|t| (field, t)))
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Client-side throttle on top of header pacing
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
            requests_per_minute: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Retry settings for 429 responses and network failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Initial wait after a 429, in seconds
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_secs: f64,

    /// Growth of the 429 wait
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff: BackoffType,

    /// Upper bound for a single retry wait, in seconds
    #[serde(default = "default_max_delay")]
    pub max_rate_limit_delay_secs: f64,

    /// Consecutive 429s tolerated per page (absent = unbounded)
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,

    /// Consecutive network failures tolerated per page
    #[serde(default = "default_network_retries")]
    pub max_network_retries: u32,

    /// Initial wait after a network failure, in seconds
    #[serde(default = "default_network_backoff")]
    pub network_backoff_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay_secs: default_rate_limit_delay(),
            rate_limit_backoff: default_rate_limit_backoff(),
            max_rate_limit_delay_secs: default_max_delay(),
            max_rate_limit_retries: None,
            max_network_retries: default_network_retries(),
            network_backoff_secs: default_network_backoff(),
        }
    }
}

fn default_rate_limit_delay() -> f64 {
    5.0
}

fn default_rate_limit_backoff() -> BackoffType {
    BackoffType::Constant
}

fn default_max_delay() -> f64 {
    300.0
}

fn default_network_retries() -> u32 {
    3
}

fn default_network_backoff() -> f64 {
    1.0
}

/// Pacing against the provider's advertised bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Fraction of the remaining window to wait once the bucket is empty
    #[serde(default = "default_replenish_fraction")]
    pub replenish_fraction: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            replenish_fraction: default_replenish_fraction(),
        }
    }
}

fn default_replenish_fraction() -> f64 {
    0.5
}

/// Log file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory for per-run log files
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,

    /// Whether to write a log file at all
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: true,
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Tests
// ============================================================================
