//! Best-effort geolocation of connection origins.
//!
//! An external collaborator queried once per connection for log metadata.
//! Lookups never gate connection acceptance: any failure (network error,
//! timeout, malformed body, disabled lookup) yields [`GeoInfo::default`]
//! with every field set to `"Unknown"`.

use std::net::IpAddr;

use serde::Deserialize;

use crate::config::RelayConfig;
use crate::error::RelayError;

/// City/region/country strings for a connection's origin address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoInfo {
    /// Origin city.
    pub city: String,
    /// Origin region or state.
    pub region: String,
    /// Origin country code.
    pub country: String,
}

impl Default for GeoInfo {
    fn default() -> Self {
        Self {
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            country: "Unknown".to_string(),
        }
    }
}

/// Wire shape of an ipinfo.io-style response. All fields optional; absent
/// ones fall back to `"Unknown"`.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl From<GeoResponse> for GeoInfo {
    fn from(resp: GeoResponse) -> Self {
        let unknown = || "Unknown".to_string();
        Self {
            city: resp.city.unwrap_or_else(unknown),
            region: resp.region.unwrap_or_else(unknown),
            country: resp.country.unwrap_or_else(unknown),
        }
    }
}

/// HTTP client for the geolocation collaborator.
#[derive(Debug)]
pub struct GeoLocator {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl GeoLocator {
    /// Creates a locator from the relay configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.geo_timeout_secs))
            .build()
            .map_err(|e| RelayError::Internal(format!("geo client init failed: {e}")))?;
        Ok(Self {
            client,
            base_url: config.geo_base_url.trim_end_matches('/').to_string(),
            enabled: config.geo_lookup_enabled,
        })
    }

    /// Looks up geolocation for an origin IP, best-effort.
    ///
    /// Returns the default `"Unknown"` info when lookup is disabled, the
    /// address is missing or loopback, or the request fails in any way.
    pub async fn lookup(&self, ip: Option<IpAddr>) -> GeoInfo {
        let Some(ip) = ip else {
            return GeoInfo::default();
        };
        if !self.enabled || ip.is_loopback() {
            return GeoInfo::default();
        }

        let url = format!("{}/{ip}/json", self.base_url);
        match self.fetch(&url).await {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(%ip, error = %e, "geolocation lookup failed");
                GeoInfo::default()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<GeoInfo, reqwest::Error> {
        let resp: GeoResponse = self.client.get(url).send().await?.json().await?;
        Ok(resp.into())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_locator(enabled: bool) -> GeoLocator {
        let config = RelayConfig {
            geo_lookup_enabled: enabled,
            ..RelayConfig::default()
        };
        let Ok(locator) = GeoLocator::new(&config) else {
            panic!("locator construction failed");
        };
        locator
    }

    #[tokio::test]
    async fn disabled_lookup_returns_unknown() {
        let locator = make_locator(false);
        let info = locator.lookup(Some(IpAddr::from([8, 8, 8, 8]))).await;
        assert_eq!(info, GeoInfo::default());
    }

    #[tokio::test]
    async fn missing_address_returns_unknown() {
        let locator = make_locator(true);
        assert_eq!(locator.lookup(None).await, GeoInfo::default());
    }

    #[tokio::test]
    async fn loopback_is_never_queried() {
        let locator = make_locator(true);
        let info = locator.lookup(Some(IpAddr::from([127, 0, 0, 1]))).await;
        assert_eq!(info, GeoInfo::default());
    }

    #[test]
    fn response_fields_default_to_unknown() {
        let resp: GeoResponse = serde_json::from_str(r#"{"city": "Oslo"}"#)
            .ok()
            .unwrap_or_else(|| panic!("parse failed"));
        let info = GeoInfo::from(resp);
        assert_eq!(info.city, "Oslo");
        assert_eq!(info.region, "Unknown");
        assert_eq!(info.country, "Unknown");
    }
}
