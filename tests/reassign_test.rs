//! End-to-end reassignment runs against an in-memory IPAM, a canned geocoder
//! and a mock registry.

use std::sync::Mutex;

use async_trait::async_trait;
use rirsync::config::{RegistryConfig, ReassignSettings};
use rirsync::geocode::{GeocodeCandidate, GeocodeError, Geocoder};
use rirsync::ipam::{Aggregate, Ipam, IpamError, NetAssignment, ObjectRef, Prefix, RirFields, Site};
use rirsync::{ArinClient, ArinError, PreconditionError, ReassignError, Reassigner, RegistryError};
use wiremock::matchers::{any, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARENT: &str = "NET-10-0-0-0-1";

#[derive(Default)]
struct MemoryIpam {
    prefixes: Vec<Prefix>,
    aggregates: Vec<Aggregate>,
    sites: Vec<Site>,
    recorded: Mutex<Vec<(u64, NetAssignment)>>,
}

impl MemoryIpam {
    fn recorded(&self) -> Vec<(u64, NetAssignment)> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ipam for MemoryIpam {
    async fn prefix(&self, id: u64) -> Result<Prefix, IpamError> {
        self.prefixes
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(IpamError::NotFound {
                kind: "prefix",
                id: id.to_string(),
            })
    }

    async fn aggregate(&self, id: u64) -> Result<Aggregate, IpamError> {
        self.aggregates
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(IpamError::NotFound {
                kind: "aggregate",
                id: id.to_string(),
            })
    }

    async fn aggregates(&self) -> Result<Vec<Aggregate>, IpamError> {
        Ok(self.aggregates.clone())
    }

    async fn aggregate_containing(&self, _prefix: &str) -> Result<Option<Aggregate>, IpamError> {
        Ok(self.aggregates.first().cloned())
    }

    async fn prefixes_within(&self, _aggregate: &Aggregate) -> Result<Vec<Prefix>, IpamError> {
        Ok(self.prefixes.clone())
    }

    async fn site(&self, id: u64) -> Result<Site, IpamError> {
        self.sites
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(IpamError::NotFound {
                kind: "site",
                id: id.to_string(),
            })
    }

    async fn record_assignment(
        &self,
        prefix_id: u64,
        assignment: &NetAssignment,
    ) -> Result<(), IpamError> {
        self.recorded
            .lock()
            .unwrap()
            .push((prefix_id, assignment.clone()));
        Ok(())
    }
}

struct CannedGeocoder(Vec<GeocodeCandidate>);

#[async_trait]
impl Geocoder for CannedGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        Ok(self.0.clone())
    }
}

fn chantilly() -> CannedGeocoder {
    CannedGeocoder(vec![
        serde_json::from_value(serde_json::json!({
            "types": ["street_address"],
            "address_components": [
                {"long_name": "3635", "short_name": "3635", "types": ["street_number"]},
                {"long_name": "Concorde Parkway", "short_name": "Concorde Pkwy", "types": ["route"]},
                {"long_name": "Chantilly", "short_name": "Chantilly", "types": ["locality", "political"]},
                {"long_name": "Virginia", "short_name": "VA", "types": ["administrative_area_level_1", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]},
                {"long_name": "20151", "short_name": "20151", "types": ["postal_code"]}
            ]
        }))
        .unwrap(),
    ])
}

fn prefix(id: u64, cidr: &str) -> Prefix {
    Prefix {
        id,
        prefix: cidr.into(),
        family: 4,
        role: Some(ObjectRef {
            id: 1,
            name: "Customer Allocation".into(),
        }),
        site: Some(ObjectRef {
            id: 3,
            name: "IAD1".into(),
        }),
        tenant: Some(ObjectRef {
            id: 9,
            name: "Acme Widgets".into(),
        }),
        custom_fields: RirFields::default(),
    }
}

fn aggregate(handle: Option<&str>) -> Aggregate {
    Aggregate {
        id: 1,
        prefix: "10.0.0.0/8".into(),
        custom_fields: RirFields {
            handle: handle.map(str::to_string),
            ..Default::default()
        },
    }
}

fn ipam(prefixes: Vec<Prefix>, parent_handle: Option<&str>) -> MemoryIpam {
    MemoryIpam {
        prefixes,
        aggregates: vec![aggregate(parent_handle)],
        sites: vec![Site {
            id: 3,
            name: "IAD1".into(),
            physical_address: "3635 Concorde Pkwy, Chantilly, VA".into(),
        }],
        ..Default::default()
    }
}

fn reassigner(
    server: &MockServer,
    ipam: MemoryIpam,
) -> Reassigner<MemoryIpam, CannedGeocoder> {
    let registry =
        ArinClient::new(RegistryConfig::new(format!("{}/rest", server.uri()), "TEST-KEY").unwrap())
            .unwrap();
    let settings = ReassignSettings::new("EXAMPLE-ORG", &["AS64500".to_string()], false).unwrap();
    Reassigner::new(ipam, chantilly(), registry, settings)
}

fn customer_response(handle: &str) -> String {
    format!(
        r#"<customer xmlns="http://www.arin.net/regrws/core/v1"><customerName>Acme Widgets</customerName>
        <iso3166-1><name>UNITED STATES</name><code2>US</code2><code3>USA</code3><e164>1</e164></iso3166-1>
        <handle>{handle}</handle><streetAddress><line number="0">3635 Concorde Parkway</line></streetAddress>
        <city>Chantilly</city><iso3166-2>VA</iso3166-2><postalCode>20151</postalCode>
        <parentOrgHandle>EXAMPLE-ORG</parentOrgHandle><registrationDate>2024-01-16T10:11:12-05:00</registrationDate>
        <privateCustomer>true</privateCustomer></customer>"#
    )
}

fn reassign_response(handle: &str, start: &str, name: &str) -> String {
    format!(
        r#"<ticketedRequest xmlns="http://www.arin.net/regrws/core/v1"><net><version>4</version>
        <registrationDate>2024-01-16T10:11:12-05:00</registrationDate><handle>{handle}</handle>
        <netBlocks><netBlock><type>S</type><startAddress>{start}</startAddress><cidrLength>24</cidrLength></netBlock></netBlocks>
        <parentNetHandle>NET-10-0-0-0-1</parentNetHandle><netName>{name}</netName>
        <customerHandle>C01234567</customerHandle></net></ticketedRequest>"#
    )
}

async fn mount_customer(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/rest/net/{PARENT}/customer")))
        .and(body_string_contains("<customerName>Acme Widgets</customerName>"))
        .and(body_string_contains("<parentOrgHandle>EXAMPLE-ORG</parentOrgHandle>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(customer_response("C01234567")))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn reassigns_prefix_and_records_handles() {
    let server = MockServer::start().await;
    mount_customer(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path(format!("/rest/net/{PARENT}/reassign")))
        .and(body_string_contains("<netName>CUST-4-10-1-1-0</netName>"))
        .and(body_string_contains("<customerHandle>C01234567</customerHandle>"))
        .and(body_string_contains("<originASes><originAS>AS64500</originAS></originASes>"))
        .and(body_string_contains("<description>Customer Allocation</description>"))
        .and(body_string_contains("<cidrLength>24</cidrLength>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(reassign_response(
            "NET-10-1-1-0-1",
            "10.1.1.0",
            "CUST-4-10-1-1-0",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let r = reassigner(&server, ipam(vec![prefix(7, "10.1.1.0/24")], Some(PARENT)));
    let assignment = r.run_prefix(7).await.unwrap();

    let expected = NetAssignment {
        handle: "NET-10-1-1-0-1".into(),
        registration_date: Some("2024-01-16T10:11:12-05:00".into()),
        net_name: Some("CUST-4-10-1-1-0".into()),
    };
    assert_eq!(assignment, expected);
    assert_eq!(r.ipam().recorded(), vec![(7, expected)]);
}

#[tokio::test]
async fn aggregate_without_handle_stops_before_the_registry() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let r = reassigner(&server, ipam(vec![prefix(7, "10.1.1.0/24")], None));
    let err = r.reassign_prefix(7).await.unwrap_err();
    assert!(matches!(
        err,
        ReassignError::Precondition(PreconditionError::MissingParentNetHandle(ref agg)) if agg == "10.0.0.0/8"
    ));
    assert!(r.ipam().recorded().is_empty());
}

#[tokio::test]
async fn rejected_customer_halts_before_reassign() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/rest/net/{PARENT}/customer")))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid payload"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/rest/net/{PARENT}/reassign")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let r = reassigner(&server, ipam(vec![prefix(7, "10.1.1.0/24")], Some(PARENT)));
    let err = r.run_prefix(7).await.unwrap_err();
    assert_eq!(err.registry_status(), Some(400));
    match err {
        ReassignError::Registry(ArinError::Registry(e)) => assert_eq!(
            e,
            RegistryError {
                status: 400,
                body: "Invalid payload".into()
            }
        ),
        other => panic!("expected registry rejection, got {other:?}"),
    }
    assert!(r.ipam().recorded().is_empty());
}

#[tokio::test]
async fn assigned_prefix_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut p = prefix(7, "10.1.1.0/24");
    p.custom_fields.handle = Some("NET-10-1-1-0-1".into());
    let r = reassigner(&server, ipam(vec![p], Some(PARENT)));
    let err = r.reassign_prefix(7).await.unwrap_err();
    assert!(matches!(
        err,
        ReassignError::Precondition(PreconditionError::AlreadyAssigned { .. })
    ));
}

#[tokio::test]
async fn aggregate_run_continues_past_failures() {
    let server = MockServer::start().await;
    mount_customer(&server, 2).await;
    Mock::given(method("PUT"))
        .and(path(format!("/rest/net/{PARENT}/reassign")))
        .and(body_string_contains("<startAddress>10.1.1.0</startAddress>"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Net overlaps"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/rest/net/{PARENT}/reassign")))
        .and(body_string_contains("<startAddress>10.1.2.0</startAddress>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(reassign_response(
            "NET-10-1-2-0-1",
            "10.1.2.0",
            "CUST-4-10-1-2-0",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut no_site = prefix(9, "10.1.3.0/24");
    no_site.site = None;
    let mut assigned = prefix(10, "10.1.4.0/24");
    assigned.custom_fields.handle = Some("NET-10-1-4-0-1".into());
    let r = reassigner(
        &server,
        ipam(
            vec![
                prefix(7, "10.1.1.0/24"),
                prefix(8, "10.1.2.0/24"),
                no_site,
                assigned,
            ],
            Some(PARENT),
        ),
    );

    let report = r.reassign_aggregate(1).await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "10.1.1.0/24");
    assert_eq!(report.failed[0].1.registry_status(), Some(400));
    assert_eq!(report.reassigned.len(), 1);
    assert_eq!(report.reassigned[0].1.handle, "NET-10-1-2-0-1");
    assert_eq!(
        report.skipped.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>(),
        vec!["10.1.3.0/24", "10.1.4.0/24"]
    );
    assert_eq!(r.ipam().recorded().len(), 1);
    assert_eq!(r.ipam().recorded()[0].0, 8);
}

#[tokio::test]
async fn geocode_without_street_result_fails_before_registry() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry =
        ArinClient::new(RegistryConfig::new(format!("{}/rest", server.uri()), "TEST-KEY").unwrap())
            .unwrap();
    let settings = ReassignSettings::new("EXAMPLE-ORG", &[], false).unwrap();
    let r = Reassigner::new(
        ipam(vec![prefix(7, "10.1.1.0/24")], Some(PARENT)),
        CannedGeocoder(Vec::new()),
        registry,
        settings,
    );
    let err = r.reassign_prefix(7).await.unwrap_err();
    assert!(matches!(err, ReassignError::Geocode(GeocodeError::NoMatch { .. })));
}
