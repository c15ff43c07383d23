//! Client configuration: endpoint, reconnect policy and timing knobs.
//!
//! Defaults mirror a local simulator plugin listening on `localhost:9000`.
//! Any field can be overridden from the environment with `ClientConfig::from_env`.

use std::{env, fmt, time::Duration};

use crate::utils::error::ConfigError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_HEARTBEAT_MS: u64 = 1_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;
// Must exceed the heartbeat and connect defaults: the worker may be blocked in either.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

const ENV_HOST: &str = "TM_HOST";
const ENV_PORT: &str = "TM_PORT";
const ENV_MAX_RECONNECT: &str = "TM_MAX_RECONNECT";
const ENV_RECONNECT_DELAY_MS: &str = "TM_RECONNECT_DELAY_MS";
const ENV_HEARTBEAT_MS: &str = "TM_HEARTBEAT_MS";
const ENV_CONNECT_TIMEOUT_MS: &str = "TM_CONNECT_TIMEOUT_MS";

/// Producer address. Immutable once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Fixed-delay retry policy. `max_attempts == None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: Option<u32>,
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn unlimited(delay: Duration) -> Self {
        Self { max_attempts: None, delay }
    }

    pub fn limited(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: Some(max_attempts), delay }
    }

    /// True while `attempts_so_far` leaves room for another connect.
    pub fn allows(&self, attempts_so_far: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => attempts_so_far < max,
        }
    }

    /// Human-readable budget for log lines ("3" or "unlimited").
    pub fn budget_label(&self) -> String {
        match self.max_attempts {
            Some(max) => max.to_string(),
            None => "unlimited".to_string(),
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::limited(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    pub reconnect: ReconnectPolicy,
    /// Read wait before a heartbeat probe is sent.
    pub heartbeat_interval: Duration,
    /// Upper bound for a single connect attempt.
    pub connect_timeout: Duration,
    /// Upper bound for joining the background thread on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new(DEFAULT_HOST, DEFAULT_PORT),
            reconnect: ReconnectPolicy::default(),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            shutdown_timeout: Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            endpoint: Endpoint::new(host, port),
            ..Self::default()
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Build from defaults, overriding any field whose `TM_*` variable is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            let host = host.trim().to_string();
            if host.is_empty() {
                return Err(ConfigError::EmptyHost);
            }
            cfg.endpoint.host = host;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            cfg.endpoint.port = parse_num(ENV_PORT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_RECONNECT) {
            cfg.reconnect.max_attempts = parse_attempts(&raw)?;
        }
        if let Some(raw) = lookup(ENV_RECONNECT_DELAY_MS) {
            cfg.reconnect.delay = Duration::from_millis(parse_num(ENV_RECONNECT_DELAY_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_HEARTBEAT_MS) {
            cfg.heartbeat_interval = parse_nonzero_ms(ENV_HEARTBEAT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            cfg.connect_timeout = parse_nonzero_ms(ENV_CONNECT_TIMEOUT_MS, &raw)?;
        }

        Ok(cfg)
    }
}

fn parse_num<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

// "0" and "unlimited" both mean retry forever.
fn parse_attempts(raw: &str) -> Result<Option<u32>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    let n: u32 = parse_num(ENV_MAX_RECONNECT, trimmed)?;
    Ok(if n == 0 { None } else { Some(n) })
}

// Zero would turn the read timeout into a blocking read (or an error for set_read_timeout).
fn parse_nonzero_ms(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = parse_num(key, raw)?;
    if ms == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}
