//! IPAM collaborator: where prefixes, aggregates, sites and tenants live, and
//! where registry handles are written back once a reassignment succeeds.

pub mod netbox;

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use netbox::NetboxClient;

#[derive(Debug, Error)]
pub enum IpamError {
    #[error("IPAM request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("IPAM returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("{kind} {id} not found in IPAM")]
    NotFound { kind: &'static str, id: String },

    #[error("IPAM token contains invalid header characters")]
    InvalidToken,
}

/// Reference to a related object as NetBox nests it (`{"id": 3, "name": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObjectRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// The three custom fields the registry side of a prefix is kept in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RirFields {
    #[serde(rename = "RIR Handle", default)]
    pub handle: Option<String>,
    #[serde(rename = "RIR registration date", default)]
    pub registration_date: Option<String>,
    #[serde(rename = "RIR Net Name", default)]
    pub net_name: Option<String>,
}

impl RirFields {
    /// The registry handle, if one is actually set.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Prefix {
    pub id: u64,
    /// CIDR notation, e.g. "10.1.1.0/24".
    pub prefix: String,
    #[serde(deserialize_with = "family")]
    pub family: u8,
    #[serde(default)]
    pub role: Option<ObjectRef>,
    #[serde(default)]
    pub site: Option<ObjectRef>,
    #[serde(default)]
    pub tenant: Option<ObjectRef>,
    #[serde(default, deserialize_with = "custom_fields")]
    pub custom_fields: RirFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Aggregate {
    pub id: u64,
    pub prefix: String,
    #[serde(default, deserialize_with = "custom_fields")]
    pub custom_fields: RirFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Site {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub physical_address: String,
}

/// What the registry gave back for a reassigned prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetAssignment {
    pub handle: String,
    pub registration_date: Option<String>,
    pub net_name: Option<String>,
}

impl From<&NetAssignment> for RirFields {
    fn from(a: &NetAssignment) -> Self {
        RirFields {
            handle: Some(a.handle.clone()),
            registration_date: a.registration_date.as_deref().map(registration_day),
            net_name: a.net_name.clone(),
        }
    }
}

/// Registry timestamps ("2024-01-16T10:11:12-05:00") become the calendar day
/// NetBox date fields accept; anything else is kept as is.
fn registration_day(value: &str) -> String {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(ts) => ts.date_naive().to_string(),
        Err(_) => value.to_string(),
    }
}

#[async_trait]
pub trait Ipam: Send + Sync {
    async fn prefix(&self, id: u64) -> Result<Prefix, IpamError>;

    async fn aggregate(&self, id: u64) -> Result<Aggregate, IpamError>;

    async fn aggregates(&self) -> Result<Vec<Aggregate>, IpamError>;

    /// The aggregate a prefix was carved from, if the IPAM has one.
    async fn aggregate_containing(&self, prefix: &str) -> Result<Option<Aggregate>, IpamError>;

    /// Every prefix inside an aggregate, the aggregate itself included.
    async fn prefixes_within(&self, aggregate: &Aggregate) -> Result<Vec<Prefix>, IpamError>;

    async fn site(&self, id: u64) -> Result<Site, IpamError>;

    /// Write the registry handle, registration date and net name back.
    async fn record_assignment(
        &self,
        prefix_id: u64,
        assignment: &NetAssignment,
    ) -> Result<(), IpamError>;
}

// NetBox has served `family` both as a bare number and as {"value", "label"}.
fn family<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Family {
        Plain(u8),
        Labeled { value: u8 },
    }
    Ok(match Family::deserialize(d)? {
        Family::Plain(v) | Family::Labeled { value: v } => v,
    })
}

fn custom_fields<'de, D: Deserializer<'de>>(d: D) -> Result<RirFields, D::Error> {
    Ok(Option::<RirFields>::deserialize(d)?.unwrap_or_default())
}
