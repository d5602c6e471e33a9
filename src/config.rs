use std::time::Duration;

use crate::error::ConfigurationError;
use crate::validation::{ValidationError, normalize_origin_as, validate_handle};

/// Reg-RWS root of the production registry.
pub const ARIN_PRODUCTION_URL: &str = "https://reg.arin.net/rest";
/// Reg-RWS root of the operational test environment.
pub const ARIN_OTE_URL: &str = "https://reg.ote.arin.net/rest";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and as whom registry requests are made.
#[derive(Clone)]
pub struct RegistryConfig {
    pub base_url: String, // e.g. "https://reg.ote.arin.net/rest"
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RegistryConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let config = Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        };
        if config.base_url_root().is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        if config.api_key.trim().is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url_root(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Full URL of a resource path such as `/net/NET-1/customer`.
    pub fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.base_url_root(),
            resource.trim_start_matches('/')
        )
    }
}

/// NetBox API endpoint and token.
#[derive(Clone)]
pub struct NetboxConfig {
    pub base_url: String, // e.g. "https://netbox.example.net"
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for NetboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetboxConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NetboxConfig {
    /// `{base}/api/{path}`
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub geocode_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("api_key", &"[REDACTED]")
            .field("geocode_url", &self.geocode_url)
            .finish()
    }
}

/// Operator-level settings of a reassignment run.
#[derive(Debug, Clone)]
pub struct ReassignSettings {
    /// Org that holds the parent nets; becomes the customers' parent org.
    pub parent_org_handle: String,
    pub origin_ases: Vec<String>,
    pub replace_existing: bool,
}

impl ReassignSettings {
    pub fn new(
        parent_org_handle: impl Into<String>,
        origin_ases: &[String],
        replace_existing: bool,
    ) -> Result<Self, ValidationError> {
        let parent_org_handle = parent_org_handle.into();
        validate_handle(&parent_org_handle)?;
        Ok(Self {
            parent_org_handle,
            origin_ases: origin_ases
                .iter()
                .map(|o| normalize_origin_as(o))
                .collect::<Result<_, _>>()?,
            replace_existing,
        })
    }
}

/// Split a comma separated origin AS list ("AS64500, 64501").
pub fn parse_origin_ases(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
