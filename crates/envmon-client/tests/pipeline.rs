//! Request pipeline integration tests.
//!
//! These tests run the client against a wiremock server and verify token
//! attachment, single-flight refresh, replay, and forced logout.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use envmon_client::{
    EnvmonClient, Error, RefreshFailure, SessionEvent, SessionStatus, SessionStore,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const REFRESH_PATH: &str = "/api/auth/token/refresh/";

/// Build a client against the mock server with the given stored tokens.
fn client_for(server: &MockServer, access: Option<&str>, refresh: Option<&str>) -> EnvmonClient {
    let session = Arc::new(SessionStore::in_memory());
    match (access, refresh) {
        (Some(access), Some(refresh)) => session.set_tokens(access, refresh),
        (Some(access), None) => session.set_access_token(access),
        (None, Some(_)) => panic!("tests store a refresh token only together with an access token"),
        (None, None) => {}
    }

    EnvmonClient::builder()
        .base_url(format!("{}/api/", server.uri()))
        .timeout(Duration::from_secs(2))
        .session(session)
        .build()
        .unwrap()
}

async fn mount_readings(server: &MockServer, token: &str, status: u16, expected: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!([]))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({"detail": "token_not_valid"}))
    };

    Mock::given(method("GET"))
        .and(path("/api/readings/"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

/// Answers 401, delaying the n-th request by the n-th entry of `delays_ms`
/// (cycling).
struct StaggeredUnauthorized {
    seen: AtomicUsize,
    delays_ms: Vec<u64>,
}

impl StaggeredUnauthorized {
    fn new(delays_ms: Vec<u64>) -> Self {
        Self {
            seen: AtomicUsize::new(0),
            delays_ms,
        }
    }
}

impl Respond for StaggeredUnauthorized {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.seen.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays_ms[n % self.delays_ms.len()];
        ResponseTemplate::new(401)
            .set_body_json(json!({"detail": "token_not_valid"}))
            .set_delay(Duration::from_millis(delay))
    }
}

async fn mount_staggered_readings(server: &MockServer, token: &str, delays_ms: Vec<u64>) {
    Mock::given(method("GET"))
        .and(path("/api/readings/"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(StaggeredUnauthorized::new(delays_ms))
        .mount(server)
        .await;
}

async fn refresh_calls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == REFRESH_PATH)
        .count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass-through
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_success_returned_without_session_changes() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let readings = client.readings().list().await.unwrap();

    assert!(readings.is_empty());
    assert_eq!(client.session().access_token().as_deref(), Some("A1"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("R1"));
    assert_eq!(client.refresh_count(), 0);
}

#[tokio::test]
async fn test_client_and_server_errors_are_returned_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/zonas/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"detail":"No encontrado."}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/zonas/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));

    let err = client.zones().get(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail().as_deref(), Some("No encontrado."));

    let err = client.zones().list().await.unwrap_err();
    match err {
        Error::Server { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected server error, got {:?}", other),
    }

    assert_eq!(client.session().status(), SessionStatus::Authenticated);
    assert_eq!(client.refresh_count(), 0);
}

#[tokio::test]
async fn test_request_without_token_has_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/zonas/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    client.zones().list().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_network_failure_is_reported() {
    let client = EnvmonClient::builder()
        .base_url("http://127.0.0.1:9/api/")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.zones().list().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh and replay
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_401_refreshes_and_replays_with_new_token() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    mount_readings(&server, "A2", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let mut events = client.subscribe();

    let readings = client.readings().list().await.unwrap();

    assert!(readings.is_empty());
    assert_eq!(client.session().access_token().as_deref(), Some("A2"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("R1"));
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    mount_readings(&server, "A2", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A2", "refresh": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    client.readings().list().await.unwrap();

    assert_eq!(client.session().access_token().as_deref(), Some("A2"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_replayed_request_keeps_method_and_body() {
    let server = MockServer::start().await;
    let body = json!({
        "nombre_zona": "Norte",
        "descripcion": "Cuenca alta",
        "latitud": null,
        "longitud": null,
        "is_active": true
    });
    Mock::given(method("POST"))
        .and(path("/api/zonas/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/zonas/"))
        .and(header("authorization", "Bearer A2"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1,
            "nombre_zona": "Norte",
            "descripcion": "Cuenca alta",
            "latitud": null,
            "longitud": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let zone = client
        .zones()
        .create(&serde_json::from_value(body).unwrap())
        .await
        .unwrap();

    assert_eq!(zone.id, 1);
    assert_eq!(zone.name, "Norte");
}

#[tokio::test]
async fn test_second_401_after_retry_ends_session() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    mount_readings(&server, "A2", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let mut events = client.subscribe();

    let err = client.readings().list().await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired { cause: None }), "got {:?}", err);
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_missing_refresh_token_expires_without_refresh_call() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), None);
    let mut events = client.subscribe();

    let err = client.readings().list().await.unwrap_err();

    assert!(
        matches!(
            err,
            Error::SessionExpired {
                cause: Some(RefreshFailure::MissingRefreshToken)
            }
        ),
        "got {:?}",
        err
    );
    assert!(client.session().access_token().is_none());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_rejected_refresh_clears_both_tokens() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Token is invalid"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let mut events = client.subscribe();

    let err = client.readings().list().await.unwrap_err();

    match err {
        Error::SessionExpired {
            cause: Some(RefreshFailure::Rejected { status, .. }),
        } => assert_eq!(status, 400),
        other => panic!("expected rejected refresh, got {:?}", other),
    }
    assert!(client.session().access_token().is_none());
    assert!(client.session().refresh_token().is_none());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_refresh_timeout_is_terminal() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    session.set_tokens("A1", "R1");
    let client = EnvmonClient::builder()
        .base_url(format!("{}/api/", server.uri()))
        .timeout(Duration::from_millis(100))
        .session(session)
        .build()
        .unwrap();

    let err = client.readings().list().await.unwrap_err();

    assert!(
        matches!(
            err,
            Error::SessionExpired {
                cause: Some(RefreshFailure::Network(_))
            }
        ),
        "got {:?}",
        err
    );
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_unreadable_refresh_response_is_terminal() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let err = client.readings().list().await.unwrap_err();

    assert!(
        matches!(
            err,
            Error::SessionExpired {
                cause: Some(RefreshFailure::InvalidResponse(_))
            }
        ),
        "got {:?}",
        err
    );
    assert!(client.session().refresh_token().is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 5).await;
    mount_readings(&server, "A2", 200, 5).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));

    let calls = (0..5).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert!(result.unwrap().is_ok());
    }
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(client.session().access_token().as_deref(), Some("A2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_all_fail_when_refresh_fails() {
    let server = MockServer::start().await;
    mount_readings(&server, "A1", 401, 4).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is blacklisted"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));

    let calls = (0..4).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        let err = result.unwrap().unwrap_err();
        assert!(err.is_session_expired(), "got {:?}", err);
    }
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_staggered_401s_around_refresh_share_one_refresh() {
    for _ in 0..30 {
        let server = MockServer::start().await;
        mount_staggered_readings(&server, "A1", vec![0, 1, 2, 3, 4]).await;
        mount_readings(&server, "A2", 200, 24).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A2"}))
                    .set_delay(Duration::from_millis(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("A1"), Some("R1"));

        let calls = (0..24).map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.readings().list().await })
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(refresh_calls(&server).await, 1);
        assert_eq!(client.refresh_count(), 1);
        assert_eq!(client.session().access_token().as_deref(), Some("A2"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_401_after_successful_refresh_retries_without_refreshing() {
    let server = MockServer::start().await;
    mount_staggered_readings(&server, "A1", vec![0, 300]).await;
    mount_readings(&server, "A2", 200, 2).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    // Sent with A1 while the refresh is still running; its 401 lands after it.
    let late = {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    };

    assert!(first.await.unwrap().is_ok());
    assert!(late.await.unwrap().is_ok());
    assert_eq!(refresh_calls(&server).await, 1);
    assert_eq!(client.refresh_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_401_after_failed_refresh_shares_its_outcome() {
    let server = MockServer::start().await;
    mount_staggered_readings(&server, "A1", vec![0, 300]).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Token is invalid"}))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some("A1"), Some("R1"));
    let mut events = client.subscribe();

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let late = {
        let client = client.clone();
        tokio::spawn(async move { client.readings().list().await })
    };

    for result in [first.await.unwrap(), late.await.unwrap()] {
        match result.unwrap_err() {
            Error::SessionExpired {
                cause: Some(RefreshFailure::Rejected { status, .. }),
            } => assert_eq!(status, 400),
            other => panic!("expected rejected refresh, got {:?}", other),
        }
    }
    assert_eq!(refresh_calls(&server).await, 1);
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_unreadable_error_body_keeps_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        // Promise more body than is sent, then hang up.
        let _ = socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
            .await;
    });

    let client = EnvmonClient::builder()
        .base_url(format!("http://{}/api/", addr))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    match client.zones().list().await.unwrap_err() {
        Error::Server { status, body } => {
            assert_eq!(status, 500);
            assert!(body.is_empty());
        }
        other => panic!("expected server error, got {:?}", other),
    }
}
