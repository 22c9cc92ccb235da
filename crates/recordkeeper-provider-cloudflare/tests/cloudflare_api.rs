//! Contract Test: Cloudflare API v4
//!
//! Drives `CloudflareProvider` against a mock API server.
//!
//! Constraints verified:
//! - Listing scans stop on the page holding the match
//! - A miss across every page is a lookup failure after one call per page
//! - Name matching only considers A and AAAA records
//! - Known identifiers are trusted over name matching
//! - Updates send the entry's attributes in a single PUT
//! - Refused updates, malformed bodies and unreachable servers map to
//!   distinct results

use recordkeeper_core::{DnsProvider, Entry, Error};
use recordkeeper_provider_cloudflare::{CloudflareProvider, Credentials, SERVICE_KEY_USERNAME};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "ops@example.com";
const KEY: &str = "test-global-key";

fn provider_for(server: &MockServer) -> CloudflareProvider {
    CloudflareProvider::new(
        Credentials::from_pair(EMAIL, KEY),
        Duration::from_secs(5),
    )
    .expect("client builds")
    .with_base_url(server.uri())
}

fn listing(result: Value, page: u32, total_pages: u32) -> Value {
    json!({
        "result": result,
        "success": true,
        "errors": [],
        "messages": [],
        "result_info": {
            "page": page,
            "per_page": 20,
            "count": 1,
            "total_count": total_pages * 20,
            "total_pages": total_pages
        }
    })
}

fn record(id: &str, name: &str, content: &str, proxied: bool) -> Value {
    typed_record(id, "A", name, content, proxied)
}

fn typed_record(id: &str, record_type: &str, name: &str, content: &str, proxied: bool) -> Value {
    json!({
        "id": id,
        "zone_id": "Z1",
        "zone_name": "example.com",
        "name": name,
        "type": record_type,
        "content": content,
        "proxiable": true,
        "proxied": proxied,
        "ttl": 1
    })
}

async fn mount_zone_page(server: &MockServer, page: u32, total: u32, zones: Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(zones, page, total)))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_record_page(server: &MockServer, page: u32, total: u32, records: Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(records, page, total)))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn zone_found_on_first_page_in_one_call() {
    let server = MockServer::start().await;
    mount_zone_page(
        &server,
        1,
        1,
        json!([{ "id": "Z0", "name": "other.net" }, { "id": "Z1", "name": "example.com" }]),
        1,
    )
    .await;

    let zone_id = provider_for(&server)
        .zone_id_for("home.example.com")
        .await
        .expect("zone resolves");

    assert_eq!(zone_id, "Z1");
}

#[tokio::test]
async fn zone_missing_on_every_page_is_lookup_failure() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, 2, json!([{ "id": "Z0", "name": "other.net" }]), 1).await;
    mount_zone_page(&server, 2, 2, json!([{ "id": "Z9", "name": "third.org" }]), 1).await;

    let result = provider_for(&server).zone_id_for("home.example.com").await;

    assert!(matches!(result, Err(Error::Lookup(_))), "got {:?}", result);
}

#[tokio::test]
async fn record_on_third_page_takes_three_calls() {
    let server = MockServer::start().await;
    mount_record_page(
        &server,
        1,
        3,
        json!([record("RA", "a.example.com", "198.51.100.1", false)]),
        1,
    )
    .await;
    mount_record_page(
        &server,
        2,
        3,
        json!([record("RB", "b.example.com", "198.51.100.2", false)]),
        1,
    )
    .await;
    mount_record_page(
        &server,
        3,
        3,
        json!([record("R1", "home.example.com", "203.0.113.4", false)]),
        1,
    )
    .await;

    let found = provider_for(&server)
        .find_record("Z1", "", "home.example.com")
        .await
        .expect("record resolves");

    assert_eq!(found.id, "R1");
    assert_eq!(found.address, "203.0.113.4");
    assert_eq!(found.record_type, "A");
}

#[tokio::test]
async fn record_missing_on_every_page_is_lookup_failure() {
    let server = MockServer::start().await;
    mount_record_page(
        &server,
        1,
        2,
        json!([record("RA", "a.example.com", "198.51.100.1", false)]),
        1,
    )
    .await;
    mount_record_page(
        &server,
        2,
        2,
        json!([record("RB", "b.example.com", "198.51.100.2", false)]),
        1,
    )
    .await;

    let result = provider_for(&server)
        .find_record("Z1", "", "home.example.com")
        .await;

    assert!(matches!(result, Err(Error::Lookup(_))), "got {:?}", result);
}

#[tokio::test]
async fn name_match_skips_non_address_records() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, 1, json!([{ "id": "Z1", "name": "example.com" }]), 1).await;
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            json!([
                typed_record("TXT1", "TXT", "home.example.com", "v=spf1 -all", false),
                typed_record("MX1", "MX", "home.example.com", "mail.example.com", false),
                record("A1", "home.example.com", "203.0.113.4", false)
            ]),
            1,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/A1"))
        .and(body_json(json!({
            "name": "home.example.com",
            "content": "203.0.113.5",
            "type": "A",
            "proxied": false,
            "ttl": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": record("A1", "home.example.com", "203.0.113.5", false),
            "success": true,
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/TXT1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut entry = Entry::new("home.example.com", "public");

    provider.resolve(&mut entry).await.unwrap();
    assert_eq!(entry.record_id, "A1");
    assert_eq!(entry.record_type, "A");
    assert_eq!(entry.address, "203.0.113.4");

    assert!(provider.set_address("203.0.113.5", &mut entry).await.unwrap());
}

#[tokio::test]
async fn name_only_non_address_records_is_lookup_failure() {
    let server = MockServer::start().await;
    mount_record_page(
        &server,
        1,
        1,
        json!([typed_record("C1", "CNAME", "home.example.com", "edge.example.net", false)]),
        1,
    )
    .await;

    let result = provider_for(&server)
        .find_record("Z1", "", "home.example.com")
        .await;

    assert!(matches!(result, Err(Error::Lookup(_))), "got {:?}", result);
}

#[tokio::test]
async fn resolve_hydrates_then_reuses_zone() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, 1, json!([{ "id": "Z1", "name": "example.com" }]), 1).await;

    // First listing reports proxied=false, every later one proxied=true
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            json!([record("R1", "home.example.com", "203.0.113.4", false)]),
            1,
            1,
        )))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            json!([record("R1", "home.example.com", "203.0.113.4", true)]),
            1,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut entry = Entry::new("home.example.com", "public");

    provider.resolve(&mut entry).await.expect("first resolve");
    assert_eq!(entry.zone_id, "Z1");
    assert_eq!(entry.record_id, "R1");
    assert_eq!(entry.address, "203.0.113.4");
    assert_eq!(entry.ttl, 1);
    assert!(!entry.proxied);
    assert!(entry.resolved_at.is_some());

    provider.resolve(&mut entry).await.expect("second resolve");
    assert!(entry.proxied, "proxied refreshed");
    assert_eq!(entry.zone_id, "Z1");
}

#[tokio::test]
async fn cached_record_id_beats_name_match() {
    let server = MockServer::start().await;
    mount_record_page(
        &server,
        1,
        1,
        json!([
            record("R-OTHER", "home.example.com", "198.51.100.9", false),
            record("R1", "renamed.example.com", "203.0.113.4", false)
        ]),
        1,
    )
    .await;

    let found = provider_for(&server)
        .find_record("Z1", "R1", "home.example.com")
        .await
        .expect("record resolves by id");

    assert_eq!(found.id, "R1");
    assert_eq!(found.address, "203.0.113.4");
}

#[tokio::test]
async fn cached_record_id_absent_is_lookup_failure() {
    let server = MockServer::start().await;
    mount_record_page(
        &server,
        1,
        1,
        json!([record("R2", "home.example.com", "203.0.113.4", false)]),
        1,
    )
    .await;

    let result = provider_for(&server)
        .find_record("Z1", "R1", "home.example.com")
        .await;

    assert!(matches!(result, Err(Error::Lookup(_))));
}

#[tokio::test]
async fn update_sends_entry_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/R1"))
        .and(header("X-Auth-Email", EMAIL))
        .and(header("X-Auth-Key", KEY))
        .and(header("X-Content-Type", "application/json"))
        .and(body_json(json!({
            "name": "home.example.com",
            "content": "203.0.113.5",
            "type": "A",
            "proxied": true,
            "ttl": 120
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": record("R1", "home.example.com", "203.0.113.5", true),
            "success": true,
            "errors": [],
            "messages": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = Entry::new("home.example.com", "203.0.113.4");
    entry.zone_id = "Z1".to_string();
    entry.record_id = "R1".to_string();
    entry.record_type = "A".to_string();
    entry.proxied = true;
    entry.ttl = 120;

    let accepted = provider_for(&server)
        .set_address("203.0.113.5", &mut entry)
        .await
        .expect("update sent");

    assert!(accepted);
    assert_eq!(entry.address, "203.0.113.5");
}

#[tokio::test]
async fn refused_update_is_false_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/R1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "result": null,
            "success": false,
            "errors": [{ "code": 9005, "message": "Content for A record is invalid" }],
            "messages": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = Entry::new("home.example.com", "203.0.113.4");
    entry.zone_id = "Z1".to_string();
    entry.record_id = "R1".to_string();
    entry.record_type = "A".to_string();

    let accepted = provider_for(&server)
        .set_address("not-an-address", &mut entry)
        .await
        .expect("well-formed refusal");

    assert!(!accepted);
}

#[tokio::test]
async fn unresolved_entry_is_resolved_before_update() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, 1, json!([{ "id": "Z1", "name": "example.com" }]), 1).await;
    mount_record_page(
        &server,
        1,
        1,
        json!([record("R1", "home.example.com", "203.0.113.4", false)]),
        1,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": record("R1", "home.example.com", "203.0.113.5", false),
            "success": true,
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = Entry::new("home.example.com", "public");
    let accepted = provider_for(&server)
        .set_address("203.0.113.5", &mut entry)
        .await
        .expect("update sent");

    assert!(accepted);
    assert_eq!(entry.record_id, "R1");
    assert_eq!(entry.address, "203.0.113.5");
}

#[tokio::test]
async fn html_body_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html><body>Bad gateway</body></html>"),
        )
        .mount(&server)
        .await;

    let result = provider_for(&server).zone_id_for("home.example.com").await;

    match result {
        Err(Error::Decode(message)) => assert!(message.contains("502"), "{}", message),
        other => panic!("expected decode failure, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_failure() {
    let provider = CloudflareProvider::new(
        Credentials::from_pair(EMAIL, KEY),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_base_url("http://127.0.0.1:1");

    let result = provider.zone_id_for("home.example.com").await;

    assert!(matches!(result, Err(Error::Transport(_))), "got {:?}", result);
}

#[tokio::test]
async fn failed_listing_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "result": null,
            "success": false,
            "errors": [{ "code": 10000, "message": "Authentication error" }],
            "messages": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider_for(&server).zone_id_for("home.example.com").await;

    match result {
        Err(Error::Provider { provider, message }) => {
            assert_eq!(provider, "cloudflare");
            assert!(message.contains("Authentication error"));
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn service_key_header_used_for_sentinel_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("X-Auth-User-Service-Key", "v1.0-service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            json!([{ "id": "Z1", "name": "example.com" }]),
            1,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = CloudflareProvider::new(
        Credentials::from_pair(SERVICE_KEY_USERNAME, "v1.0-service-key"),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_base_url(server.uri());

    let zone_id = provider.zone_id_for("home.example.com").await.unwrap();
    assert_eq!(zone_id, "Z1");

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests[0].headers.get("X-Auth-Email").is_none());
}

#[tokio::test]
async fn public_address_change_end_to_end() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, 1, json!([{ "id": "Z1", "name": "example.com" }]), 1).await;
    mount_record_page(
        &server,
        1,
        1,
        json!([record("R1", "home.example.com", "203.0.113.4", false)]),
        1,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/zones/Z1/dns_records/R1"))
        .and(body_json(json!({
            "name": "home.example.com",
            "content": "203.0.113.5",
            "type": "A",
            "proxied": false,
            "ttl": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": record("R1", "home.example.com", "203.0.113.5", false),
            "success": true,
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut entry = Entry::new("home.example.com", "public");

    provider.resolve(&mut entry).await.unwrap();
    assert_eq!(entry.address, "203.0.113.4");

    let accepted = provider.set_address("203.0.113.5", &mut entry).await.unwrap();
    assert!(accepted);
}
