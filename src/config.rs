//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Capacity of each connection's outbound event queue. Events to a
    /// peer whose queue is full are dropped rather than blocking
    /// matchmaking.
    pub send_queue_capacity: usize,

    /// Master switch for the geolocation lookup at connect time.
    pub geo_lookup_enabled: bool,

    /// Base URL of the geolocation service (ipinfo.io-compatible).
    pub geo_base_url: String,

    /// Timeout in seconds for a geolocation request.
    pub geo_timeout_secs: u64,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let send_queue_capacity = parse_env("SEND_QUEUE_CAPACITY", 64);

        let geo_lookup_enabled = parse_env_bool("GEO_LOOKUP_ENABLED", true);
        let geo_base_url =
            std::env::var("GEO_BASE_URL").unwrap_or_else(|_| "http://ipinfo.io".to_string());
        let geo_timeout_secs = parse_env("GEO_TIMEOUT_SECS", 3);

        Ok(Self {
            listen_addr,
            send_queue_capacity,
            geo_lookup_enabled,
            geo_base_url,
            geo_timeout_secs,
        })
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            send_queue_capacity: 64,
            geo_lookup_enabled: true,
            geo_base_url: "http://ipinfo.io".to_string(),
            geo_timeout_secs: 3,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
