//! Integration tests for the auto-relogin pipeline

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hexagon_client::core::connection::{ConnectionMonitor, ConnectionStatus};
use hexagon_client::core::hexagon::Hexagon;
use hexagon_client::core::notify::{NoticeLevel, RecordingNotifier};
use hexagon_client::error::client::{ClientError, ErrorKind};
use hexagon_client::http::reauth::Reauthenticator;
use hexagon_client::model::api_response::LoginResponse;
use hexagon_client::model::login_session::{LoginGrant, LoginSession};
use hexagon_client::model::selection::SelectionRequest;
use hexagon_client::storage::local_store::{KeyValueStore, MemoryStore, keys};
use hexagon_client::storage::schema;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seed_session(store: &MemoryStore) -> LoginSession {
    let session = LoginSession::new(
        "20231120",
        "secret",
        LoginGrant {
            token: "stale-token".to_string(),
            weu: "weu-1".to_string(),
            jsessionid: "js-1".to_string(),
        },
    );
    schema::write_entity(store, keys::LOGIN_INFO, &session).unwrap();
    session
}

fn stored_session(store: &MemoryStore) -> Option<LoginSession> {
    schema::read_entity(store, keys::LOGIN_INFO).unwrap()
}

struct Harness {
    server: MockServer,
    store: Arc<MemoryStore>,
    monitor: Arc<ConnectionMonitor>,
    notifier: Arc<RecordingNotifier>,
    api: Hexagon,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    seed_session(&store);
    let monitor = Arc::new(ConnectionMonitor::new());
    monitor.init_from_store(&*store);
    let notifier = Arc::new(RecordingNotifier::new());
    let api = Hexagon::new(store.clone(), monitor.clone(), notifier.clone(), &server.uri()).unwrap();
    Harness {
        server,
        store,
        monitor,
        notifier,
        api,
    }
}

#[tokio::test]
async fn expired_session_is_renewed_and_request_replayed() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/get-batches"))
        .and(header("token", "stale-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get-batches"))
        .and(header("token", "fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "获取成功！",
            "data": [{"code": "B1"}]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": "20231120", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "fresh-token",
            "WEU": "weu-2",
            "JSESSIONID": "js-2"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let batches = h.api.get_batches().await.unwrap();
    assert_eq!(batches, json!([{"code": "B1"}]));

    assert_eq!(h.monitor.status(), ConnectionStatus::Connected);
    assert!(!h.monitor.is_reconnecting());

    let session = stored_session(&h.store).unwrap();
    assert_eq!(session.username, "20231120");
    assert_eq!(session.password, "secret");
    assert_eq!(session.token, "fresh-token");
    assert_eq!(session.weu, "weu-2");
    assert_eq!(session.jsessionid, "js-2");

    assert_eq!(h.notifier.levels(), vec![NoticeLevel::Success]);
}

#[tokio::test]
async fn rejected_relogin_drops_session_and_returns_original_401() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/get-batches"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "登录失败，请检查用户名和密码"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.get_batches().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert_eq!(h.monitor.status(), ConnectionStatus::Disconnected);
    assert!(!h.monitor.is_reconnecting());
    assert_eq!(h.store.get_item(keys::LOGIN_INFO).unwrap(), None);
    assert_eq!(h.notifier.levels(), vec![NoticeLevel::Error]);
}

#[tokio::test]
async fn missing_session_skips_login_call() {
    let h = harness().await;
    let session = stored_session(&h.store).unwrap();
    h.store.remove_item(keys::LOGIN_INFO).unwrap();

    Mock::given(method("POST"))
        .and(path("/select-class"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let request = SelectionRequest::new(&session, "B1", "JXB1");
    let err = h.api.select_class(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(h.monitor.status(), ConnectionStatus::Disconnected);
}

#[derive(Default)]
struct GatedReauth {
    calls: AtomicUsize,
    gate: Notify,
}

#[async_trait]
impl Reauthenticator for GatedReauth {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(LoginResponse {
            success: true,
            token: Some("fresh-token".to_string()),
            ..LoginResponse::default()
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_401_does_not_start_second_relogin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get-batches"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    seed_session(&store);
    let monitor = Arc::new(ConnectionMonitor::new());
    let reauth = Arc::new(GatedReauth::default());
    let api = Arc::new(
        Hexagon::with_reauthenticator(
            store.clone(),
            monitor.clone(),
            Arc::new(RecordingNotifier::new()),
            reauth.clone(),
            &server.uri(),
        )
        .unwrap(),
    );

    let first = tokio::spawn({
        let api = api.clone();
        async move { api.get_batches().await }
    });

    while reauth.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(monitor.status(), ConnectionStatus::Reconnecting);

    let second = api.get_batches().await.unwrap_err();
    assert_eq!(second.kind(), ErrorKind::Unauthorized);
    assert_eq!(reauth.calls.load(Ordering::SeqCst), 1);

    reauth.gate.notify_one();
    // 重放的请求仍然拿到 401，不会再次重新登录
    let first = first.await.unwrap().unwrap_err();
    assert_eq!(first.kind(), ErrorKind::Unauthorized);
    assert_eq!(reauth.calls.load(Ordering::SeqCst), 1);
    assert!(!monitor.is_reconnecting());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn unreachable_server_marks_disconnected() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(MemoryStore::new());
    seed_session(&store);
    let monitor = Arc::new(ConnectionMonitor::new());
    monitor.init_from_store(&*store);
    assert_eq!(monitor.status(), ConnectionStatus::Connected);

    let api = Hexagon::new(
        store.clone(),
        monitor.clone(),
        Arc::new(RecordingNotifier::new()),
        &format!("http://{}", addr),
    )
    .unwrap();

    let err = api.get_batches().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(monitor.status(), ConnectionStatus::Disconnected);
    assert!(stored_session(&store).is_some());
}

#[tokio::test]
async fn server_error_still_counts_as_connected() {
    let h = harness().await;
    h.monitor.reset();

    Mock::given(method("POST"))
        .and(path("/get-batches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.get_batches().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(h.monitor.status(), ConnectionStatus::Connected);
    assert!(h.notifier.notices().is_empty());
}
