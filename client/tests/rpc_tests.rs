//! Soroban RPC and confirmation polling against a mock JSON-RPC server.

use assert_matches::assert_matches;
use gated_door_client::{
    ClientConfig, ClientError, GatedDoorClient, MonitorResult, SendStatus, TransactionStatus,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};

const ENVELOPE: &str = "AAAAAgAAAAA=";

fn create_test_config(rpc_url: String) -> Arc<ClientConfig> {
    Arc::new(
        ClientConfig::custom(rpc_url, "Test SDF Network ; September 2015".to_string())
            .unwrap()
            .with_request_timeout(Duration::from_secs(5))
            .with_max_retries(3)
            .with_retry_config(10, 50, 2.0)
            .with_tx_config(50, 1),
    )
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result
    }))
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_and_latest_ledger() {
    let server = MockServer::start().await;
    mount(
        &server,
        "getHealth",
        rpc_result(json!({ "status": "healthy", "latestLedger": 500, "oldestLedger": 10 })),
    )
    .await;
    mount(
        &server,
        "getLatestLedger",
        rpc_result(json!({ "id": "abcd", "protocolVersion": 23, "sequence": 98765 })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();

    assert!(client.health_check().await.unwrap());
    let health = client.rpc().get_health().await.unwrap();
    assert_eq!(health.latest_ledger, Some(500));

    let ledger = client.latest_ledger().await.unwrap();
    assert_eq!(ledger.sequence, 98765);
    assert_eq!(ledger.protocol_version, 23);
}

#[tokio::test]
async fn test_send_transaction_pending() {
    let server = MockServer::start().await;
    mount(
        &server,
        "sendTransaction",
        rpc_result(json!({ "hash": "tx_hash", "status": "PENDING", "latestLedger": 42 })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();
    let sent = client.submit(ENVELOPE).await.unwrap();

    assert_eq!(sent.hash, "tx_hash");
    assert_eq!(sent.status, SendStatus::Pending);
    assert_eq!(sent.latest_ledger, Some(42));
}

#[tokio::test]
async fn test_send_transaction_error_status() {
    let server = MockServer::start().await;
    mount(
        &server,
        "sendTransaction",
        rpc_result(json!({ "hash": "bad_tx", "status": "ERROR", "errorResultXdr": "AAAA" })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();
    let err = client.submit(ENVELOPE).await.unwrap_err();

    assert_matches!(
        err,
        ClientError::TransactionFailed { hash, message } if hash == "bad_tx" && message == "AAAA"
    );
}

#[tokio::test]
async fn test_invalid_envelope_never_reaches_the_node() {
    let server = MockServer::start().await;
    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();

    let err = client.submit("not base64 at all!").await.unwrap_err();
    assert_matches!(err, ClientError::InvalidEnvelope(_));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_submit_and_wait_success() {
    let server = MockServer::start().await;
    mount(
        &server,
        "sendTransaction",
        rpc_result(json!({ "hash": "door_tx", "status": "PENDING" })),
    )
    .await;
    mount(
        &server,
        "getTransaction",
        rpc_result(json!({ "status": "SUCCESS", "ledger": 777, "resultXdr": "AAAA" })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();
    let info = client.submit_and_wait(ENVELOPE).await.unwrap();

    assert_eq!(info.hash, "door_tx");
    assert_eq!(info.status, TransactionStatus::Success);
    assert_eq!(info.ledger, Some(777));
}

#[tokio::test]
async fn test_failed_transaction_is_an_error() {
    let server = MockServer::start().await;
    mount(
        &server,
        "getTransaction",
        rpc_result(json!({ "status": "FAILED", "ledger": 12, "resultXdr": "FAILXDR" })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();

    let outcome = client.monitor().monitor("failing").await.unwrap();
    assert_matches!(outcome, MonitorResult::Failed(info) if info.ledger == Some(12));

    let err = client.monitor().wait_for_confirmation("failing").await.unwrap_err();
    assert_matches!(err, ClientError::TransactionFailed { message, .. } if message == "FAILXDR");
}

#[tokio::test]
async fn test_monitor_times_out_on_unknown_transaction() {
    let server = MockServer::start().await;
    mount(&server, "getTransaction", rpc_result(json!({ "status": "NOT_FOUND" }))).await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();

    assert_eq!(
        client.status("missing").await.unwrap(),
        TransactionStatus::NotFound
    );
    assert_eq!(
        client.monitor().monitor("missing").await.unwrap(),
        MonitorResult::Timeout
    );
    assert_matches!(
        client.monitor().wait_for_confirmation("missing").await,
        Err(ClientError::TransactionTimeout(1))
    );
}

#[tokio::test]
async fn test_transient_http_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount(
        &server,
        "getLatestLedger",
        rpc_result(json!({ "id": "abcd", "protocolVersion": 23, "sequence": 5 })),
    )
    .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();
    let ledger = client.latest_ledger().await.unwrap();

    assert_eq!(ledger.sequence, 5);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_rpc_error_is_reported_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "invalid parameters" }
        })))
        .mount(&server)
        .await;

    let client = GatedDoorClient::new(create_test_config(server.uri())).unwrap();
    let err = client.latest_ledger().await.unwrap_err();

    assert_matches!(err, ClientError::Rpc(message) if message.contains("invalid parameters"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
