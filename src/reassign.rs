//! Simple reassignment of IPAM prefixes to registry customers.
//!
//! For one prefix: resolve its tenant, site and parent aggregate, geocode the
//! site, create the recipient customer under the aggregate's parent net,
//! reassign a net covering the prefix to that customer and hand back what the
//! registry assigned. Registry records created before a later step fails are
//! left in place; they stand on their own.

use std::str::FromStr;

use ipnetwork::IpNetwork;
use thiserror::Error;
use tracing::{error, info};

use crate::arin::ArinClient;
use crate::arin::payloads::{CustomerPayload, NetBlockPayload, NetPayload};
use crate::config::ReassignSettings;
use crate::error::ArinError;
use crate::geocode::{self, GeocodeError, Geocoder};
use crate::ipam::{Ipam, IpamError, NetAssignment, Prefix};
use crate::validation::ValidationError;

/// Why a prefix cannot be reassigned as it stands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("{prefix} already has RIR handle {handle}")]
    AlreadyAssigned { prefix: String, handle: String },

    #[error("{0} has no tenant")]
    MissingTenant(String),

    #[error("{0} has no site")]
    MissingSite(String),

    #[error("{0} is not inside any aggregate")]
    NoAggregate(String),

    #[error("aggregate {0} has no RIR handle")]
    MissingParentNetHandle(String),

    #[error("'{prefix}' is not a network prefix: {reason}")]
    InvalidPrefix { prefix: String, reason: String },
}

impl PreconditionError {
    /// Conditions a batch run passes over quietly.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            PreconditionError::AlreadyAssigned { .. }
                | PreconditionError::MissingTenant(_)
                | PreconditionError::MissingSite(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ReassignError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Ipam(#[from] IpamError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Registry(#[from] ArinError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("registry response carries no {0} handle")]
    MissingHandle(&'static str),
}

impl ReassignError {
    /// HTTP status of a registry rejection, if that is what stopped the run.
    pub fn registry_status(&self) -> Option<u16> {
        match self {
            ReassignError::Registry(e) => e.status(),
            _ => None,
        }
    }
}

/// Outcome of one aggregate run, one entry per prefix visited.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reassigned: Vec<(String, NetAssignment)>,
    pub skipped: Vec<(String, PreconditionError)>,
    pub failed: Vec<(String, ReassignError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `CUST-<family>-<network address with separators as hyphens>`,
/// e.g. "CUST-4-10-1-1-0" or "CUST-6-2001-DB8". IPv6 groups are written out
/// in full up to the last non-zero one, so distinct networks get distinct names.
pub fn net_name(network: &IpNetwork) -> String {
    let parts: Vec<String> = match network {
        IpNetwork::V4(n) => n.network().octets().iter().map(u8::to_string).collect(),
        IpNetwork::V6(n) => {
            let segments = n.network().segments();
            let used = segments.iter().rposition(|s| *s != 0).map_or(1, |i| i + 1);
            segments[..used].iter().map(|s| format!("{s:X}")).collect()
        }
    };
    let family = if network.is_ipv4() { 4 } else { 6 };
    format!("CUST-{family}-{}", parts.join("-"))
}

/// Parse a prefix, refusing host bits past the prefix length.
pub fn parse_network(prefix: &str) -> Result<IpNetwork, PreconditionError> {
    let invalid = |reason: String| PreconditionError::InvalidPrefix {
        prefix: prefix.to_string(),
        reason,
    };
    let network = IpNetwork::from_str(prefix.trim()).map_err(|e| invalid(e.to_string()))?;
    if network.ip() != network.network() {
        return Err(invalid(format!("host bits set past /{}", network.prefix())));
    }
    Ok(network)
}

pub struct Reassigner<I, G> {
    ipam: I,
    geocoder: G,
    registry: ArinClient,
    settings: ReassignSettings,
}

impl<I: Ipam, G: Geocoder> Reassigner<I, G> {
    pub fn new(ipam: I, geocoder: G, registry: ArinClient, settings: ReassignSettings) -> Self {
        Self {
            ipam,
            geocoder,
            registry,
            settings,
        }
    }

    pub fn ipam(&self) -> &I {
        &self.ipam
    }

    /// Reassign one prefix and return what the registry assigned. Nothing is
    /// written back to the IPAM.
    pub async fn reassign_prefix(&self, prefix_id: u64) -> Result<NetAssignment, ReassignError> {
        let prefix = self.ipam.prefix(prefix_id).await?;
        self.reassign(&prefix).await
    }

    /// [`reassign_prefix`](Self::reassign_prefix), then record the result on
    /// the prefix.
    pub async fn run_prefix(&self, prefix_id: u64) -> Result<NetAssignment, ReassignError> {
        let prefix = self.ipam.prefix(prefix_id).await?;
        self.reassign_and_record(&prefix).await
    }

    /// Reassign every eligible prefix inside an aggregate, one after another.
    /// A failing prefix is logged and recorded; the run moves on.
    pub async fn reassign_aggregate(&self, aggregate_id: u64) -> Result<BatchReport, ReassignError> {
        let aggregate = self.ipam.aggregate(aggregate_id).await?;
        let prefixes = self.ipam.prefixes_within(&aggregate).await?;
        info!(aggregate = %aggregate.prefix, count = prefixes.len(), "reassigning aggregate");

        let mut report = BatchReport::default();
        for prefix in prefixes {
            if let Some(reason) = self.skip_reason(&prefix) {
                info!(prefix = %prefix.prefix, %reason, "skipping");
                report.skipped.push((prefix.prefix, reason));
                continue;
            }
            match self.reassign_and_record(&prefix).await {
                Ok(assignment) => report.reassigned.push((prefix.prefix, assignment)),
                Err(e) => {
                    error!(prefix = %prefix.prefix, error = %e, "reassignment failed");
                    report.failed.push((prefix.prefix, e));
                }
            }
        }
        Ok(report)
    }

    fn skip_reason(&self, prefix: &Prefix) -> Option<PreconditionError> {
        if !self.settings.replace_existing {
            if let Some(handle) = prefix.custom_fields.handle() {
                return Some(PreconditionError::AlreadyAssigned {
                    prefix: prefix.prefix.clone(),
                    handle: handle.to_string(),
                });
            }
        }
        if prefix.tenant.is_none() {
            return Some(PreconditionError::MissingTenant(prefix.prefix.clone()));
        }
        if prefix.site.is_none() {
            return Some(PreconditionError::MissingSite(prefix.prefix.clone()));
        }
        None
    }

    async fn reassign_and_record(&self, prefix: &Prefix) -> Result<NetAssignment, ReassignError> {
        let assignment = self.reassign(prefix).await?;
        self.ipam.record_assignment(prefix.id, &assignment).await?;
        info!(
            prefix = %prefix.prefix,
            handle = %assignment.handle,
            "recorded registry handle"
        );
        Ok(assignment)
    }

    async fn reassign(&self, prefix: &Prefix) -> Result<NetAssignment, ReassignError> {
        if let Some(reason) = self.skip_reason(prefix) {
            return Err(reason.into());
        }
        let network = parse_network(&prefix.prefix)?;
        let version = if network.is_ipv4() { 4 } else { 6 };
        if prefix.family != version {
            return Err(PreconditionError::InvalidPrefix {
                prefix: prefix.prefix.clone(),
                reason: format!("recorded as IPv{} in the IPAM", prefix.family),
            }
            .into());
        }

        let aggregate = self
            .ipam
            .aggregate_containing(&prefix.prefix)
            .await?
            .ok_or_else(|| PreconditionError::NoAggregate(prefix.prefix.clone()))?;
        let parent_net_handle = aggregate
            .custom_fields
            .handle()
            .ok_or_else(|| PreconditionError::MissingParentNetHandle(aggregate.prefix.clone()))?;

        // skip_reason has already ruled out a missing tenant or site
        let (Some(tenant), Some(site_ref)) = (&prefix.tenant, &prefix.site) else {
            return Err(PreconditionError::MissingTenant(prefix.prefix.clone()).into());
        };
        let site = self.ipam.site(site_ref.id).await?;
        info!(
            prefix = %prefix.prefix,
            site = %site.name,
            tenant = %tenant.name,
            "processing"
        );

        let address = geocode::locate(&self.geocoder, &site.physical_address).await?;
        let customer = CustomerPayload::new(
            tenant.name.clone(),
            address,
            Some(self.settings.parent_org_handle.clone()),
            true,
        )?;
        let customer = self
            .registry
            .create_recipient_customer(parent_net_handle, &customer)
            .await?;
        let customer_handle = customer
            .handle()
            .ok_or(ReassignError::MissingHandle("customer"))?;
        info!(prefix = %prefix.prefix, customer = customer_handle, "created customer");

        let description = prefix
            .role
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| prefix.prefix.clone());
        let block =
            NetBlockPayload::cidr(network.network().to_string(), network.prefix(), description)?;
        let net = NetPayload::builder(version)
            .net_block(block)
            .parent_net_handle(parent_net_handle)
            .net_name(net_name(&network))
            .origin_ases(self.settings.origin_ases.iter().cloned())
            .customer_handle(customer_handle)
            .build()?;

        let net = self
            .registry
            .reassign_net(parent_net_handle, &net)
            .await?
            .into_net()
            .map_err(ArinError::from)?;
        let handle = net.handle().ok_or(ReassignError::MissingHandle("net"))?;

        Ok(NetAssignment {
            handle: handle.to_string(),
            registration_date: net.registration_date().map(str::to_string),
            net_name: net.net_name.clone(),
        })
    }
}
