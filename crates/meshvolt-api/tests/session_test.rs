#![allow(clippy::unwrap_used)]
// Integration tests for `RadioSession` using wiremock.
//
// Every ubus call is a POST to the same path, so multi-call tests
// sequence their mocks with `up_to_n_times(1)`: the login mock consumes
// the first request and later mocks catch the rest.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meshvolt_api::{Credentials, Error, RadioSession};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "c0fefe1234567890c0fefe1234567890";

fn credentials() -> Credentials {
    Credentials {
        username: "configurator".into(),
        password: secrecy::SecretString::from("test".to_string()),
    }
}

async fn setup() -> (MockServer, RadioSession) {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/ubus", server.uri())).unwrap();
    let session = RadioSession::with_endpoint(reqwest::Client::new(), endpoint, credentials());
    (server, session)
}

fn login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": [0, { "ubus_rpc_session": TOKEN, "timeout": 300 }]
    }))
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(login_ok())
        .up_to_n_times(1)
        .mount(server)
        .await;
}

// ── Login tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    assert!(!session.is_authenticated());
    session.login().await.unwrap();
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32002, "message": "Access denied" }
        })))
        .mount(&server)
        .await;

    let result = session.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_nonzero_status() {
    // Some firmwares report access-denied as a bare status code.
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [6] })),
        )
        .mount(&server)
        .await;

    let result = session.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_missing_token() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [0, {}] })),
        )
        .mount(&server)
        .await;

    let result = session.login().await;

    assert!(
        matches!(result, Err(Error::Protocol { .. })),
        "expected Protocol error, got: {result:?}"
    );
    assert!(!session.is_authenticated());
}

// ── Sensor tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_voltage_scales_stdout() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    let stdout = "{\"VIN VOLTAGE\": \"151.5\", \"TEMPERATURE\": \"31.2\"}\n";
    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [0, { "stdout": stdout, "stderr": "" }]
        })))
        .mount(&server)
        .await;

    session.login().await.unwrap();
    let voltage = session.read_voltage().await.unwrap();

    // 151.5 raw / 20.2 divisor
    assert!((voltage - 7.5).abs() < 1e-9, "got {voltage}");
}

#[tokio::test]
async fn test_read_voltage_requires_login() {
    let (_server, session) = setup().await;

    let result = session.read_voltage().await;

    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_read_voltage_garbled_stdout() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [0, { "stdout": "cat: /tmp/run/pancake.txt: No such file", "stderr": "" }]
        })))
        .mount(&server)
        .await;

    session.login().await.unwrap();
    let result = session.read_voltage().await;

    assert!(
        matches!(result, Err(Error::Protocol { .. })),
        "expected Protocol error, got: {result:?}"
    );
}

// ── Association tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_list_associations() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [0, { "results": [
                { "mac": "AA:BB:CC:DD:44:25", "signal": -61, "noise": -95, "inactive": 10 },
                { "mac": "AA:BB:CC:DD:44:26", "signal": -70 }
            ]}]
        })))
        .mount(&server)
        .await;

    session.login().await.unwrap();
    let peers = session.list_associations().await.unwrap();

    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].mac, "AA:BB:CC:DD:44:25");
    assert_eq!(peers[0].signal, Some(-61));
    assert_eq!(peers[1].noise, None);
}

#[tokio::test]
async fn test_list_associations_missing_results() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [0, {}] })),
        )
        .mount(&server)
        .await;

    session.login().await.unwrap();
    let result = session.list_associations().await;

    assert!(
        matches!(result, Err(Error::Protocol { .. })),
        "expected Protocol error, got: {result:?}"
    );
}

// ── Logout tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_logout_idempotent() {
    let (server, mut session) = setup().await;
    mount_login(&server).await;

    // Exactly one session.destroy call, despite two logout()s.
    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [0] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    session.login().await.unwrap();
    session.logout().await;
    session.logout().await;

    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_logout_before_login_is_noop() {
    let (server, mut session) = setup().await;

    session.logout().await;

    // Without a token there is nothing to destroy: no request at all.
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
