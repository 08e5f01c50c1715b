//! Integration tests for the full search pipeline against a mock upstream.
//!
//! These exercise the orchestrator loop end to end: cache reuse, retry
//! behavior against transient failures, fatal-error short-circuits, and
//! size clamping at the HTTP boundary.

use datajud_search::{Config, DatajudClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test configuration pointed at the mock server: fast backoff, no
/// inter-request gap, generous per-minute budget.
fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.upstream.base_url = base_url.to_string();
    config.upstream.api_key = Some("test-key".to_string());
    config.rate_limit.requests_per_minute = 600;
    config.rate_limit.min_interval_ms = 0;
    config.retry.base_delay_ms = 10;
    config
}

fn envelope(total: u64, hits: serde_json::Value) -> serde_json::Value {
    json!({ "hits": { "total": { "value": total, "relation": "eq" }, "hits": hits } })
}

fn public_hit(number: &str) -> serde_json::Value {
    json!({
        "_source": {
            "numeroProcesso": number,
            "classe": { "codigo": 1116, "nome": "Monitória" },
            "tribunal": "TJSP",
            "grau": "G1",
            "dataAjuizamento": "2020-03-15T00:00:00.000Z",
            "nivelSigilo": 0
        }
    })
}

#[tokio::test]
async fn second_lookup_within_ttl_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_tjsp/_search"))
        .and(header("Authorization", "APIKey test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(1, json!([public_hit("00012345620208260100")]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let first = client
        .search_by_number("tjsp", "0001234-56.2020.8.26.0100", 10)
        .await
        .unwrap();
    let second = client
        .search_by_number("tjsp", "0001234-56.2020.8.26.0100", 10)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(client.stats().await.requests_issued, 1);
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_stj/_search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api_publica_stj/_search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(1, json!([public_hit("42")]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let result = client.search_by_number("stj", "42", 10).await.unwrap();

    assert_eq!(result.records.len(), 1);
    // Three retries plus the original attempt
    assert_eq!(client.stats().await.requests_issued, 4);
}

#[tokio::test]
async fn exhausted_retries_surface_a_distinct_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_stj/_search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let err = client.search_by_number("stj", "42", 10).await.unwrap_err();

    assert_eq!(err.code(), "RATE_LIMIT");
    assert_eq!(client.stats().await.requests_issued, 4);
}

#[tokio::test]
async fn connection_resets_are_retried_on_the_backoff_schedule() {
    // An upstream that accepts and immediately resets every connection:
    // each attempt dies mid-flight rather than failing to connect.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                let _ = socket.set_linger(Some(std::time::Duration::ZERO));
                drop(socket);
            }
        }
    });

    let client = DatajudClient::new(test_config(&format!("http://{}", addr))).unwrap();
    let err = client.search_by_number("stj", "42", 10).await.unwrap_err();

    // Transient transport failures burn the whole retry budget before
    // surfacing as exhaustion, never as an immediate fatal error
    assert_eq!(err.code(), "RATE_LIMIT");
    assert_eq!(client.stats().await.requests_issued, 4);
}

#[tokio::test]
async fn auth_failures_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_trf1/_search"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let err = client.search_by_number("trf1", "42", 10).await.unwrap_err();

    assert_eq!(err.code(), "AUTH");
    assert_eq!(client.stats().await.requests_issued, 1);
}

#[tokio::test]
async fn upstream_bad_request_surfaces_as_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_tjmg/_search"))
        .respond_with(ResponseTemplate::new(400).set_body_string("malformed query"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let err = client.search_by_number("tjmg", "42", 10).await.unwrap_err();

    assert_eq!(err.code(), "VALIDATION");
}

#[tokio::test]
async fn oversized_requests_are_clamped_and_share_the_cache_entry() {
    let server = MockServer::start().await;
    // The wire only ever sees the clamped size
    Mock::given(method("POST"))
        .and(path("/api_publica_tjsp/_search"))
        .and(body_partial_json(json!({ "size": 10_000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(0, json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    client.search_by_number("tjsp", "42", 50_000).await.unwrap();
    // The clamped size keys the cache, so the capped equivalent hits it
    client.search_by_number("tjsp", "42", 10_000).await.unwrap();

    assert_eq!(client.stats().await.requests_issued, 1);
}

#[tokio::test]
async fn restricted_records_never_expose_party_or_movement_detail() {
    let server = MockServer::start().await;
    let hit = json!({
        "_source": {
            "numeroProcesso": "99",
            "classe": { "codigo": 12, "nome": "Inquérito" },
            "grau": "G1",
            "nivelSigilo": 2,
            "partes": [ { "nome": "Sigiloso", "polo": "AT" } ],
            "movimentos": [ { "codigo": 26, "nome": "Distribuição" } ]
        }
    });
    Mock::given(method("POST"))
        .and(path("/api_publica_stj/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(1, json!([hit]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    let result = client.search_by_number("stj", "99", 10).await.unwrap();

    let record = &result.records[0];
    assert_eq!(record.confidentiality_level, 2);
    assert!(record.parties.is_empty());
    assert!(record.movements.is_empty());
    assert!(record.restriction_notice.is_some());
    // Structural fields are still usable
    assert_eq!(record.process_number, "99");
    assert_eq!(record.class.code, 12);
}

#[tokio::test]
async fn query_shape_reaches_the_wire_for_class_searches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_publica_tjsp/_search"))
        .and(body_partial_json(json!({
            "query": { "bool": { "must": [ { "match": { "classe.nome": "Monitorio" } } ] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(0, json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatajudClient::new(test_config(&server.uri())).unwrap();
    client
        .search_by_class("tjsp", "Monitorio", 50, None, None, None)
        .await
        .unwrap();
}
