use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{GeocodeCandidate, GeocodeError, Geocoder};
use crate::config::GoogleConfig;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    http: Client,
    config: GoogleConfig,
}

impl GoogleGeocoder {
    pub fn new(config: GoogleConfig) -> Result<Self, GeocodeError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        debug!(address, "geocoding");
        let res = self
            .http
            .get(&self.config.geocode_url)
            .query(&[("address", address), ("key", self.config.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<GeocodeResponse>()
            .await?;

        match res.status.as_str() {
            "OK" => Ok(res.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            _ => Err(GeocodeError::Status {
                status: res.status,
                message: res.error_message.unwrap_or_default(),
            }),
        }
    }
}
