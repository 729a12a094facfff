use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;

/// Which shared store implementation to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend `{other}`")),
        }
    }
}

/// Admission API configuration, loaded from environment variables.
///
/// Built once in `main` and handed to every component by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Redis connection string. `None` leaves the store unconfigured.
    pub redis_url: Option<String>,
    pub store_backend: StoreBackend,
    /// Upper bound on a single store round trip.
    pub store_timeout: Duration,
    /// Admissions are refused once this many sessions are active.
    pub concurrency_limit: u64,
    /// First visits per calendar day beyond this total are refused.
    pub daily_limit: u64,
    /// Silence after which a session stops counting as present.
    pub liveness_window: Duration,
    pub session_ttl_secs: u64,
    pub counter_ttl_secs: u64,
    /// Offset of the local time zone that defines "today".
    pub utc_offset: FixedOffset,
    pub cookie_max_age_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4010,
            redis_url: None,
            store_backend: StoreBackend::Redis,
            store_timeout: Duration::from_millis(500),
            concurrency_limit: 100,
            daily_limit: 100,
            liveness_window: Duration::from_secs(60),
            session_ttl_secs: 24 * 3600,
            counter_ttl_secs: 2 * 24 * 3600,
            utc_offset: kiosk_common::day::offset_from_minutes(0),
            cookie_max_age_secs: 24 * 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// Panics with a descriptive message if a variable is set but unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_var("PORT", defaults.port),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            store_backend: parsed_var("STORE_BACKEND", defaults.store_backend),
            store_timeout: Duration::from_millis(parsed_var("STORE_TIMEOUT_MS", 500)),
            concurrency_limit: parsed_var("CONCURRENCY_LIMIT", defaults.concurrency_limit),
            daily_limit: parsed_var("DAILY_LIMIT", defaults.daily_limit),
            liveness_window: Duration::from_secs(parsed_var("LIVENESS_WINDOW_SECS", 60)),
            session_ttl_secs: parsed_var("SESSION_TTL_SECS", defaults.session_ttl_secs),
            counter_ttl_secs: parsed_var("COUNTER_TTL_SECS", defaults.counter_ttl_secs),
            utc_offset: kiosk_common::day::offset_from_minutes(parsed_var(
                "UTC_OFFSET_MINUTES",
                0,
            )),
            cookie_max_age_secs: parsed_var("COOKIE_MAX_AGE_SECS", defaults.cookie_max_age_secs),
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T
where
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} env var is invalid: {e}")),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = Config::default();
        assert_eq!(config.concurrency_limit, 100);
        assert_eq!(config.daily_limit, 100);
        assert_eq!(config.liveness_window, Duration::from_secs(60));
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.counter_ttl_secs, 172_800);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!("MEMORY".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("etcd".parse::<StoreBackend>().is_err());
    }
}
