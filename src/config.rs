//! Configuration types for media-relay
//!
//! Every field has a default so the server starts with only `APIFY_TOKEN` set.
//! [`Config::from_env`] layers environment variables over those defaults.

use crate::error::{Error, Result};
use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

/// Platforms served out of the box, in route registration order
pub const KNOWN_PLATFORMS: &[&str] = &[
    "tiktok",
    "instagram",
    "facebook",
    "snapchat",
    "pinterest",
    "youtube",
];

/// Default task for the tiktok route
pub const DEFAULT_TIKTOK_TASK: &str = "scraper-mind/tiktok-video-downloader";

/// Main configuration for media-relay
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote task runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Run polling budget for the submit-and-poll fallback
    #[serde(default)]
    pub poll: PollConfig,

    /// Short-link resolution
    #[serde(default)]
    pub redirect: RedirectConfig,

    /// Platforms exposed under `/api/:platform`
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformConfig>,

    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration (consumed by the binary)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            poll: PollConfig::default(),
            redirect: RedirectConfig::default(),
            platforms: default_platforms(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Remote task runner configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Base URL of the runner API (default: "https://api.apify.com/v2")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Authorization token; requests fail with a configuration error when unset
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Per-call timeout (None = transport default)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            request_timeout: None,
        }
    }
}

/// Polling budget for a submitted run
///
/// Worst case wait is `max_attempts * interval` (90 seconds by default).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of status queries (default: 30)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between status queries, in milliseconds on the wire (default: 3000)
    #[serde(default = "default_poll_interval", with = "duration_millis_serde")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_poll_interval(),
        }
    }
}

/// Short-link resolution configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Hosts whose links are expanded before being handed to the runner
    #[serde(default = "default_short_link_hosts")]
    pub short_link_hosts: Vec<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            short_link_hosts: default_short_link_hosts(),
        }
    }
}

/// One platform route and the task that serves it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Route name, as in `/api/{name}`
    pub name: String,

    /// Task run for this platform
    pub task_id: TaskId,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter string, e.g. "info" or "media_relay=debug,tower_http=warn"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit log records as newline-delimited JSON
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Read `MEDIA_RELAY_LOG` and `MEDIA_RELAY_LOG_JSON` from the environment
    ///
    /// Needs no other settings, so the binary can install its subscriber
    /// before the rest of the configuration is parsed and logged about.
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: lookup("MEDIA_RELAY_LOG").unwrap_or_else(default_log_level),
            json: parse_flag(lookup, "MEDIA_RELAY_LOG_JSON").unwrap_or(false),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Build a [`Config`] from environment variables, falling back to defaults
    ///
    /// Unparsable numeric values fall back to their defaults; an unparsable
    /// `HOST`/`PORT` pair is a configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a [`Config`] from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "5000".to_string());
        let bind_address = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config {
                message: format!("invalid bind address {}:{}: {}", host, port, e),
                key: Some("PORT".to_string()),
            })?;

        let platforms = KNOWN_PLATFORMS
            .iter()
            .filter_map(|name| {
                let key = format!("{}_TASK_ID", name.to_ascii_uppercase());
                let task = lookup(&key).or_else(|| {
                    (*name == "tiktok").then(|| DEFAULT_TIKTOK_TASK.to_string())
                })?;
                TaskId::parse(task).map(|task_id| PlatformConfig {
                    name: name.to_string(),
                    task_id,
                })
            })
            .collect();

        let config = Config {
            runner: RunnerConfig {
                api_base: lookup("RUNNER_API_BASE").unwrap_or_else(default_api_base),
                token: lookup("APIFY_TOKEN").filter(|t| !t.trim().is_empty()),
                request_timeout: parse_value::<u64>(&lookup, "RUNNER_REQUEST_TIMEOUT_SECS")
                    .map(Duration::from_secs),
            },
            poll: PollConfig {
                max_attempts: parse_value(&lookup, "POLL_MAX_ATTEMPTS")
                    .unwrap_or_else(default_max_attempts),
                interval: parse_value::<u64>(&lookup, "POLL_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or_else(default_poll_interval),
            },
            redirect: RedirectConfig {
                short_link_hosts: lookup("SHORT_LINK_HOSTS")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(default_short_link_hosts),
            },
            platforms,
            api: ApiConfig {
                bind_address,
                cors_enabled: parse_flag(&lookup, "CORS_ENABLED").unwrap_or(true),
                cors_origins: lookup("CORS_ORIGINS")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(default_cors_origins),
                swagger_ui: parse_flag(&lookup, "SWAGGER_UI").unwrap_or(true),
            },
            logging: LoggingConfig::from_lookup(&lookup),
        };

        Ok(config)
    }

    /// Check settings that would otherwise fail at request time
    ///
    /// A missing token is deliberately not an error here: the server still
    /// starts and reports the misconfiguration per request.
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval.is_zero() {
            return Err(Error::Config {
                message: "poll interval must be greater than zero".to_string(),
                key: Some("POLL_INTERVAL_MS".to_string()),
            });
        }

        if url::Url::parse(&self.runner.api_base).is_err() {
            return Err(Error::Config {
                message: format!("invalid runner API base URL: {}", self.runner.api_base),
                key: Some("RUNNER_API_BASE".to_string()),
            });
        }

        for (i, platform) in self.platforms.iter().enumerate() {
            if platform.name.is_empty() || platform.task_id.as_str().is_empty() {
                return Err(Error::Config {
                    message: format!("platform entry {} needs a name and a task id", i),
                    key: Some("platforms".to_string()),
                });
            }
        }

        Ok(())
    }

    /// Look up the route configuration for a platform name
    pub fn platform(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|p| p.name == name)
    }
}

fn parse_value<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_api_base() -> String {
    "https://api.apify.com/v2".to_string()
}

fn default_max_attempts() -> u32 {
    30
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(3000)
}

fn default_short_link_hosts() -> Vec<String> {
    vec!["vm.tiktok.com".to_string(), "vt.tiktok.com".to_string()]
}

fn default_platforms() -> Vec<PlatformConfig> {
    TaskId::parse(DEFAULT_TIKTOK_TASK)
        .map(|task_id| PlatformConfig {
            name: "tiktok".to_string(),
            task_id,
        })
        .into_iter()
        .collect()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper (seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
