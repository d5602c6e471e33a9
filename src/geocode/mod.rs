//! Turning a site's free-form address into the structured postal address the
//! registry requires.

pub mod country;
pub mod google;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::arin::payloads::PostalAddress;
use crate::validation::ValidationError;

pub use google::GoogleGeocoder;

/// Candidate place types accepted by default: precise street-level results.
pub const DEFAULT_TYPES: &[&str] = &["street_address", "premise", "subpremise"];

/// Address component types that feed the postal address.
pub const USEFUL_TYPES: &[&str] = &[
    "street_number",
    "route",
    "locality",
    "administrative_area_level_1",
    "country",
    "postal_code",
];

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder answered {status}: {message}")]
    Status { status: String, message: String },

    #[error("no geocode result of the types {expected:?}")]
    NoMatch { expected: Vec<String> },

    #[error("geocode result has no {0} component")]
    MissingComponent(&'static str),

    #[error("country code '{0}' is not an ISO-3166-1 country")]
    UnsupportedCountry(String),

    #[error("geocoded address is incomplete: {0}")]
    Address(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

/// First candidate whose types all lie within `expected`.
pub fn select_candidate<'a>(
    candidates: &'a [GeocodeCandidate],
    expected: &[&str],
) -> Result<&'a GeocodeCandidate, GeocodeError> {
    candidates
        .iter()
        .find(|c| c.types.iter().all(|t| expected.contains(&t.as_str())))
        .ok_or_else(|| GeocodeError::NoMatch {
            expected: expected.iter().map(|t| t.to_string()).collect(),
        })
}

/// Useful components of one candidate, keyed by each component's primary type.
#[derive(Debug, Clone, Default)]
pub struct GeocodedAddress {
    components: HashMap<String, AddressComponent>,
}

impl GeocodedAddress {
    pub fn from_candidate(candidate: &GeocodeCandidate) -> Self {
        let components = candidate
            .address_components
            .iter()
            .filter(|c| c.types.iter().any(|t| USEFUL_TYPES.contains(&t.as_str())))
            .filter_map(|c| c.types.first().map(|kind| (kind.clone(), c.clone())))
            .collect();
        Self { components }
    }

    pub fn long_name(&self, kind: &str) -> Option<&str> {
        self.components.get(kind).map(|c| c.long_name.as_str())
    }

    pub fn short_name(&self, kind: &str) -> Option<&str> {
        self.components.get(kind).map(|c| c.short_name.as_str())
    }

    fn require(&self, kind: &'static str) -> Result<&str, GeocodeError> {
        self.long_name(kind)
            .ok_or(GeocodeError::MissingComponent(kind))
    }

    /// "{street_number} {route}"
    pub fn street_address(&self) -> Result<String, GeocodeError> {
        Ok(format!(
            "{} {}",
            self.require("street_number")?,
            self.require("route")?
        ))
    }

    pub fn city(&self) -> Result<&str, GeocodeError> {
        self.require("locality")
    }

    pub fn to_postal_address(&self) -> Result<PostalAddress, GeocodeError> {
        let code = self
            .short_name("country")
            .ok_or(GeocodeError::MissingComponent("country"))?;
        let country =
            country::by_alpha2(code).ok_or_else(|| GeocodeError::UnsupportedCountry(code.into()))?;
        let address = PostalAddress {
            country: country.to_iso3166_1(),
            street_address: self.street_address()?,
            city: self.city()?.to_string(),
            iso3166_2: self
                .short_name("administrative_area_level_1")
                .map(str::to_string),
            postal_code: self.long_name("postal_code").map(str::to_string),
        };
        address.validate()?;
        Ok(address)
    }
}

/// Geocode `address` and build the postal address of the best street-level
/// match.
pub async fn locate<G: Geocoder + ?Sized>(
    geocoder: &G,
    address: &str,
) -> Result<PostalAddress, GeocodeError> {
    let candidates = geocoder.geocode(address).await?;
    let candidate = select_candidate(&candidates, DEFAULT_TYPES)?;
    GeocodedAddress::from_candidate(candidate).to_postal_address()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chantilly() -> GeocodeCandidate {
        serde_json::from_value(json!({
            "types": ["street_address"],
            "formatted_address": "3635 Concorde Pkwy, Chantilly, VA 20151, USA",
            "address_components": [
                {"long_name": "3635", "short_name": "3635", "types": ["street_number"]},
                {"long_name": "Concorde Parkway", "short_name": "Concorde Pkwy", "types": ["route"]},
                {"long_name": "Chantilly", "short_name": "Chantilly", "types": ["locality", "political"]},
                {"long_name": "Fairfax County", "short_name": "Fairfax County", "types": ["administrative_area_level_2", "political"]},
                {"long_name": "Virginia", "short_name": "VA", "types": ["administrative_area_level_1", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]},
                {"long_name": "20151", "short_name": "20151", "types": ["postal_code"]}
            ]
        }))
        .unwrap()
    }

    fn locality_only() -> GeocodeCandidate {
        serde_json::from_value(json!({
            "types": ["locality", "political"],
            "address_components": [
                {"long_name": "Chantilly", "short_name": "Chantilly", "types": ["locality", "political"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn selects_first_street_level_candidate() {
        let candidates = vec![locality_only(), chantilly()];
        let picked = select_candidate(&candidates, DEFAULT_TYPES).unwrap();
        assert_eq!(picked.types, vec!["street_address"]);
    }

    #[test]
    fn no_street_level_candidate() {
        let err = select_candidate(&[locality_only()], DEFAULT_TYPES).unwrap_err();
        assert!(matches!(err, GeocodeError::NoMatch { expected } if expected.len() == 3));
    }

    #[test]
    fn builds_postal_address() {
        let address = GeocodedAddress::from_candidate(&chantilly())
            .to_postal_address()
            .unwrap();
        assert_eq!(address.street_address, "3635 Concorde Parkway");
        assert_eq!(address.city, "Chantilly");
        assert_eq!(address.iso3166_2.as_deref(), Some("VA"));
        assert_eq!(address.postal_code.as_deref(), Some("20151"));
        assert_eq!(address.country.code3, "USA");
    }

    #[test]
    fn ignores_components_outside_the_useful_set() {
        let geo = GeocodedAddress::from_candidate(&chantilly());
        assert!(geo.long_name("administrative_area_level_2").is_none());
        assert_eq!(geo.long_name("locality"), Some("Chantilly"));
    }

    fn with_country(code: &str, name: &str) -> GeocodeCandidate {
        let mut c = chantilly();
        for comp in &mut c.address_components {
            if comp.types[0] == "country" {
                comp.short_name = code.into();
                comp.long_name = name.into();
            }
        }
        c
    }

    #[test]
    fn countries_outside_north_america_resolve() {
        let address = GeocodedAddress::from_candidate(&with_country("MX", "Mexico"))
            .to_postal_address()
            .unwrap();
        assert_eq!(address.country.code3, "MEX");
        assert_eq!(address.country.e164, "52");
    }

    #[test]
    fn unknown_country_code_is_unsupported() {
        let err = GeocodedAddress::from_candidate(&with_country("ZZ", "Nowhere"))
            .to_postal_address()
            .unwrap_err();
        assert!(matches!(err, GeocodeError::UnsupportedCountry(code) if code == "ZZ"));
    }

    #[test]
    fn us_address_without_postal_code_fails() {
        let mut c = chantilly();
        c.address_components.retain(|comp| comp.types[0] != "postal_code");
        let err = GeocodedAddress::from_candidate(&c)
            .to_postal_address()
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Address(_)));
    }
}
