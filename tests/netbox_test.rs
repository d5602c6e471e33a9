//! NetBox adapter and Google geocoder against mock HTTP endpoints.

use std::time::Duration;

use rirsync::config::{GoogleConfig, NetboxConfig};
use rirsync::geocode::{self, GeocodeError, Geocoder, GoogleGeocoder};
use rirsync::ipam::{Ipam, IpamError, NetAssignment, NetboxClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn netbox(server: &MockServer) -> NetboxClient {
    NetboxClient::new(NetboxConfig {
        base_url: server.uri(),
        token: "0123456789abcdef".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn aggregate_json(id: u64, prefix: &str, handle: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "prefix": prefix,
        "rir": {"id": 1, "name": "ARIN"},
        "custom_fields": {"RIR Handle": handle}
    })
}

#[tokio::test]
async fn prefix_is_fetched_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ipam/prefixes/7/"))
        .and(header("authorization", "Token 0123456789abcdef"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "prefix": "10.1.1.0/24",
            "family": {"value": 4, "label": "IPv4"},
            "site": {"id": 3, "name": "IAD1"},
            "tenant": {"id": 9, "name": "Acme Widgets"},
            "role": null,
            "custom_fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prefix = netbox(&server).prefix(7).await.unwrap();
    assert_eq!(prefix.prefix, "10.1.1.0/24");
    assert_eq!(prefix.site.unwrap().id, 3);
    assert!(prefix.role.is_none());
    assert_eq!(prefix.custom_fields.handle(), None);
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/42/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = netbox(&server).site(42).await.unwrap_err();
    assert!(matches!(err, IpamError::NotFound { kind: "site", ref id } if id == "42"));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ipam/aggregates/1/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = netbox(&server).aggregate(1).await.unwrap_err();
    assert!(matches!(err, IpamError::Status { status: 503, ref body, .. } if body == "maintenance"));
}

#[tokio::test]
async fn aggregate_listing_follows_next_links() {
    let server = MockServer::start().await;
    let next = format!("{}/api/ipam/aggregates/?limit=100&offset=100", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/ipam/aggregates/"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [aggregate_json(2, "2001:db8::/32", None)]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ipam/aggregates/"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": next,
            "results": [aggregate_json(1, "10.0.0.0/8", Some("NET-10-0-0-0-1"))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let aggregates = netbox(&server).aggregates().await.unwrap();
    assert_eq!(aggregates.len(), 2);
    assert_eq!(aggregates[0].custom_fields.handle(), Some("NET-10-0-0-0-1"));
    assert_eq!(aggregates[1].prefix, "2001:db8::/32");
    assert_eq!(aggregates[1].custom_fields.handle(), None);
}

#[tokio::test]
async fn containing_aggregate_is_searched_by_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ipam/aggregates/"))
        .and(query_param("q", "10.1.1.0/24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [aggregate_json(1, "10.0.0.0/8", Some("NET-10-0-0-0-1"))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = netbox(&server)
        .aggregate_containing("10.1.1.0/24")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, 1);
}

#[tokio::test]
async fn assignment_is_patched_into_custom_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/ipam/prefixes/7/"))
        .and(body_json(json!({
            "custom_fields": {
                "RIR Handle": "NET-10-1-1-0-1",
                "RIR registration date": "2024-01-16",
                "RIR Net Name": "CUST-4-10-1-1-0"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    netbox(&server)
        .record_assignment(
            7,
            &NetAssignment {
                handle: "NET-10-1-1-0-1".into(),
                registration_date: Some("2024-01-16T10:11:12-05:00".into()),
                net_name: Some("CUST-4-10-1-1-0".into()),
            },
        )
        .await
        .unwrap();
}

fn google(server: &MockServer) -> GoogleGeocoder {
    GoogleGeocoder::new(GoogleConfig {
        api_key: "GEO-KEY".into(),
        geocode_url: format!("{}/maps/api/geocode/json", server.uri()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn google_result_becomes_postal_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "3635 Concorde Pkwy, Chantilly, VA"))
        .and(query_param("key", "GEO-KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{
                "types": ["street_address"],
                "address_components": [
                    {"long_name": "3635", "short_name": "3635", "types": ["street_number"]},
                    {"long_name": "Concorde Parkway", "short_name": "Concorde Pkwy", "types": ["route"]},
                    {"long_name": "Chantilly", "short_name": "Chantilly", "types": ["locality", "political"]},
                    {"long_name": "Virginia", "short_name": "VA", "types": ["administrative_area_level_1", "political"]},
                    {"long_name": "United States", "short_name": "US", "types": ["country", "political"]},
                    {"long_name": "20151", "short_name": "20151", "types": ["postal_code"]}
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let address = geocode::locate(&google(&server), "3635 Concorde Pkwy, Chantilly, VA")
        .await
        .unwrap();
    assert_eq!(address.street_address, "3635 Concorde Parkway");
    assert_eq!(address.country.code2, "US");
}

#[tokio::test]
async fn google_denial_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let err = google(&server).geocode("anywhere").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Status { ref status, .. } if status == "REQUEST_DENIED"));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;
    assert!(google(&server).geocode("nowhere").await.unwrap().is_empty());
}
