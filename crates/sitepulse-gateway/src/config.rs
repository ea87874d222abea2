//! Gateway configuration types.
//!
//! Configuration comes from environment variables (optionally seeded from a
//! `.env` file by the binary), falling back to the defaults below.

use std::time::Duration;

use sitepulse_presence::PresenceConfig;

/// Configuration for the gateway service.
///
/// Built by [`GatewayConfig::from_env`]; unset keys keep the [`Default`] values.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    pub listen_addr: String,

    /// Directory holding the `RocksDB` database.
    pub data_dir: String,

    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Seconds without a heartbeat before a visitor stops counting as online.
    pub online_timeout_seconds: u64,

    /// Background expiry sweep interval in seconds; 0 disables the sweep.
    pub sweep_interval_seconds: u64,

    /// UTC offset in minutes defining the local day for the daily counter.
    pub day_utc_offset_minutes: i32,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> String {
        "/data/sitepulse".to_string()
    }

    const fn default_max_body() -> usize {
        64 * 1024 // 64 KB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_online_timeout() -> u64 {
        180 // 3 minutes
    }

    const fn default_sweep_interval() -> u64 {
        60
    }

    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values are ignored and the default is kept.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("LISTEN_ADDR") {
            config.listen_addr = val;
        } else if let Some(port) = lookup("PORT") {
            config.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(val) = lookup("DATA_DIR") {
            config.data_dir = val;
        }
        if let Some(val) = lookup("CORS_ORIGINS") {
            let origins: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
            if !origins.is_empty() {
                config.cors_origins = origins;
            }
        }
        if let Some(n) = lookup("MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            config.max_body_bytes = n;
        }
        if let Some(n) = lookup("REQUEST_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            config.request_timeout_seconds = n;
        }
        if let Some(n) = lookup("ONLINE_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            config.online_timeout_seconds = n;
        }
        if let Some(n) = lookup("SWEEP_INTERVAL_SECONDS").and_then(|v| v.parse().ok()) {
            config.sweep_interval_seconds = n;
        }
        if let Some(n) = lookup("DAY_UTC_OFFSET_MINUTES").and_then(|v| v.parse().ok()) {
            config.day_utc_offset_minutes = n;
        }

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build the presence service configuration.
    #[must_use]
    pub fn presence_config(&self) -> PresenceConfig {
        PresenceConfig {
            online_timeout_seconds: self.online_timeout_seconds,
            day_utc_offset_minutes: self.day_utc_offset_minutes,
            sweep_interval_seconds: self.sweep_interval_seconds,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            online_timeout_seconds: Self::default_online_timeout(),
            sweep_interval_seconds: Self::default_sweep_interval(),
            day_utc_offset_minutes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.online_timeout_seconds, 180);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = GatewayConfig::from_lookup(|_| None);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.sweep_interval_seconds, 60);
    }

    #[test]
    fn environment_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("DATA_DIR", "/tmp/pulse"),
            ("CORS_ORIGINS", "http://localhost:3000, https://example.com ,"),
            ("ONLINE_TIMEOUT_SECONDS", "120"),
            ("SWEEP_INTERVAL_SECONDS", "0"),
            ("DAY_UTC_OFFSET_MINUTES", "420"),
        ]));

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.data_dir, "/tmp/pulse");
        assert_eq!(
            config.cors_origins,
            vec![
                "http://localhost:3000".to_string(),
                "https://example.com".to_string()
            ]
        );

        let presence = config.presence_config();
        assert_eq!(presence.online_timeout_seconds, 120);
        assert!(presence.sweep_interval().is_none());
        assert_eq!(presence.day_offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn port_used_when_no_listen_addr() {
        let config = GatewayConfig::from_lookup(lookup_from(&[("PORT", "3001")]));
        assert_eq!(config.listen_addr, "0.0.0.0:3001");
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("ONLINE_TIMEOUT_SECONDS", "three minutes"),
            ("MAX_BODY_BYTES", "-1"),
        ]));
        assert_eq!(config.online_timeout_seconds, 180);
        assert_eq!(config.max_body_bytes, 64 * 1024);
    }
}
