//! Integration tests for DoctolibClient using wiremock
//!
//! These tests validate request shape and error mapping against a mock
//! booking service.

mod common;

use std::time::Duration;

use impfwatch::upstream::availability::next_available_date;
use impfwatch::upstream::{AvailabilityClient, AvailabilityQuery, CatalogClient, DoctolibClient};
use impfwatch::utils::error::FetchError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

fn client(server: &MockServer) -> DoctolibClient {
    DoctolibClient::with_base_url(&server.uri(), REGION, Duration::from_secs(5)).unwrap()
}

fn arena_biontech() -> AvailabilityQuery {
    AvailabilityQuery {
        start_date: date(2024, 1, 10),
        practice_id: ARENA,
        motive_id: BIONTECH,
        agenda_ids: vec![397800, 397776],
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_fetch_catalog() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/booking/ciz-berlin-berlin.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_catalog_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let catalog = client(&mock_server).fetch_catalog().await.unwrap();
    assert_eq!(catalog.places.len(), 3);
    assert_eq!(catalog.agendas.len(), 3);
    assert_eq!(catalog.visit_motives.len(), 3);
    assert!(catalog.agendas[1].booking_temporary_disabled);
}

#[tokio::test]
async fn test_catalog_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/booking/ciz-berlin-berlin.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1) // No retries
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).fetch_catalog().await;
    match result {
        Err(FetchError::Status { status, url }) => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/booking/ciz-berlin-berlin.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_catalog_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/booking/ciz-berlin-berlin.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).fetch_catalog().await;
    assert!(matches!(result, Err(FetchError::Decode { .. })));
}

#[tokio::test]
async fn test_catalog_network_error() {
    // Reserve a free port, then release it so connections are refused
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let uri = format!("http://{addr}");

    let client = DoctolibClient::with_base_url(&uri, REGION, Duration::from_secs(2)).unwrap();
    let result = client.fetch_catalog().await;
    assert!(
        matches!(result, Err(FetchError::Http(_)) | Err(FetchError::Timeout { .. })),
        "expected a transport error, got {result:?}"
    );
    assert!(result.unwrap_err().is_recoverable());
}

// ============================================================================
// Availability
// ============================================================================

#[tokio::test]
async fn test_availability_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .and(query_param("start_date", "2024-01-10"))
        .and(query_param("visit_motive_ids", "2495"))
        .and(query_param("agenda_ids", "397800-397776"))
        .and(query_param("insurance_sector", "public"))
        .and(query_param("practice_ids", "158431"))
        .and(query_param("destroy_temporary", "true"))
        .and(query_param("limit", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(availability_json("2024-01-12")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client(&mock_server)
        .fetch_availability(&arena_biontech())
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(
        next_available_date(&response).unwrap(),
        Some(date(2024, 1, 12))
    );
}

#[tokio::test]
async fn test_availability_refusal_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(no_availability_json()))
        .mount(&mock_server)
        .await;

    let response = client(&mock_server)
        .fetch_availability(&arena_biontech())
        .await
        .unwrap();

    assert!(response.is_refusal());
    assert_eq!(next_available_date(&response).unwrap(), None);
}

#[tokio::test]
async fn test_availability_hint_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 0,
            "next_slot": "2024-02-01",
            "availabilities": [{"date": "2024-01-10", "slots": []}]
        })))
        .mount(&mock_server)
        .await;

    let response = client(&mock_server)
        .fetch_availability(&arena_biontech())
        .await
        .unwrap();

    assert_eq!(next_available_date(&response).unwrap(), Some(date(2024, 2, 1)));
}

#[tokio::test]
async fn test_availability_client_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .fetch_availability(&arena_biontech())
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 400, .. })));
}

#[tokio::test]
async fn test_availability_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(availability_json("2024-01-12"))
                .set_delay(Duration::from_secs(5)), // Longer than timeout
        )
        .mount(&mock_server)
        .await;

    let client =
        DoctolibClient::with_base_url(&mock_server.uri(), REGION, Duration::from_millis(100))
            .unwrap();
    let result = client.fetch_availability(&arena_biontech()).await;

    match result {
        Err(FetchError::Timeout { url }) => assert!(url.contains("availabilities.json")),
        other => panic!("expected timeout, got {other:?}"),
    }
}
