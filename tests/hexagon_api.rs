//! Integration tests for the course-selection API client

use std::sync::Arc;

use hexagon_client::core::connection::{ConnectionMonitor, ConnectionStatus};
use hexagon_client::core::hexagon::Hexagon;
use hexagon_client::core::notify::RecordingNotifier;
use hexagon_client::error::client::ErrorKind;
use hexagon_client::model::login_session::LoginSession;
use hexagon_client::model::selection::{CourseQuery, GrabRequest, SelectionRequest};
use hexagon_client::storage::local_store::{KeyValueStore, MemoryStore, keys};
use hexagon_client::storage::schema;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (MockServer, Arc<MemoryStore>, Arc<ConnectionMonitor>, Hexagon) {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let monitor = Arc::new(ConnectionMonitor::new());
    let api = Hexagon::new(
        store.clone(),
        monitor.clone(),
        Arc::new(RecordingNotifier::new()),
        &format!("{}/", server.uri()),
    )
    .unwrap();
    (server, store, monitor, api)
}

async fn logged_in() -> (MockServer, Arc<MemoryStore>, Arc<ConnectionMonitor>, Hexagon, LoginSession) {
    let (server, store, monitor, api) = client().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "WEU": "weu",
            "JSESSIONID": "jsid"
        })))
        .mount(&server)
        .await;
    let session = api.login("20231120", "secret").await.unwrap();
    (server, store, monitor, api, session)
}

#[tokio::test]
async fn login_persists_session() {
    let (_server, store, monitor, api, session) = logged_in().await;

    assert_eq!(session.token, "tok-1");
    let stored: LoginSession = schema::read_entity(&*store, keys::LOGIN_INFO).unwrap().unwrap();
    assert_eq!(stored, session);
    assert_eq!(monitor.status(), ConnectionStatus::Connected);
    assert_eq!(api.session().unwrap().username, "20231120");

    api.logout().unwrap();
    assert_eq!(api.session().unwrap_err().kind(), ErrorKind::NotLoggedIn);
}

#[tokio::test]
async fn rejected_login_is_an_api_error() {
    let (server, store, _monitor, api) = client().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "登录失败，请检查用户名和密码"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = api.login("20231120", "wrong").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.message, "登录失败，请检查用户名和密码");
    assert_eq!(store.get_item(keys::LOGIN_INFO).unwrap(), None);
}

#[tokio::test]
async fn unauthorized_login_does_not_relogin() {
    let (server, _store, monitor, api) = client().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = api.login("20231120", "secret").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(!monitor.is_reconnecting());
}

#[tokio::test]
async fn requests_carry_session_token() {
    let (server, _store, _monitor, api, session) = logged_in().await;
    Mock::given(method("POST"))
        .and(path("/select-class"))
        .and(header("token", "tok-1"))
        .and(body_partial_json(json!({
            "username": "20231120",
            "electiveBatchCode": "B1",
            "teachingClassId": "JXB1",
            "operationType": "1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "选课成功！",
            "result": {"code": "1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = api
        .select_class(&SelectionRequest::new(&session, "B1", "JXB1"))
        .await
        .unwrap();
    assert_eq!(response.message.as_deref(), Some("选课成功！"));
    assert_eq!(response.data, Some(json!({"code": "1"})));
}

#[tokio::test]
async fn unsuccessful_selection_reports_server_message() {
    let (server, _store, monitor, api, session) = logged_in().await;
    Mock::given(method("POST"))
        .and(path("/drop-class"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "退课失败"
        })))
        .mount(&server)
        .await;

    let err = api
        .drop_class(&SelectionRequest::new(&session, "B1", "JXB1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.message, "退课失败");
    assert_eq!(monitor.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn course_search_sends_query() {
    let (server, _store, _monitor, api, session) = logged_in().await;
    Mock::given(method("POST"))
        .and(path("/get-courses"))
        .and(body_partial_json(json!({
            "electiveBatchCode": "B1",
            "queryContent": "数学",
            "checkConflict": "2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"dataList": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = CourseQuery {
        query_content: "数学".to_string(),
        ..CourseQuery::new(&session, "B1")
    };
    assert_eq!(api.get_courses(&query).await.unwrap(), json!({"dataList": []}));
}

#[tokio::test]
async fn grab_task_lifecycle() {
    let (server, _store, _monitor, api, session) = logged_in().await;
    Mock::given(method("POST"))
        .and(path("/start-grab-course"))
        .and(body_partial_json(json!({"selectRate": 5, "teachingClassId": "JXB9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "抢课任务已启动",
            "task_id": "task-42"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/grab-course-status/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"status": "running", "attempts": 3}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/stop-grab-course"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "任务不存在或已停止"
        })))
        .mount(&server)
        .await;

    let request = GrabRequest {
        select_rate: 5,
        ..GrabRequest::new(SelectionRequest::new(&session, "B1", "JXB9"))
    };
    let task_id = api.start_grab_course(&request).await.unwrap();
    assert_eq!(task_id, "task-42");

    let status = api.grab_course_status(&task_id).await.unwrap();
    assert_eq!(status["status"], json!("running"));

    let err = api.stop_grab_course(&task_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.message, "任务不存在或已停止");
}
