use std::sync::Arc;

use log::{debug, info};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::connection::ConnectionMonitor;
use crate::core::notify::Notifier;
use crate::error::client::{ClientError, ErrorKind};
use crate::http::auth_middleware::AuthHeaderMiddleware;
use crate::http::reauth::{HttpReauthenticator, Reauthenticator};
use crate::http::session_middleware::{SessionMiddleware, SkipRelogin};
use crate::model::api_response::{ApiResponse, LoginResponse};
use crate::model::login_session::LoginSession;
use crate::model::selection::{CourseQuery, GrabRequest, SelectionRequest};
use crate::storage::local_store::{KeyValueStore, keys};
use crate::storage::schema;

/// 选课服务的客户端。所有请求都经过会话中间件
pub struct Hexagon {
    client: ClientWithMiddleware,
    store: Arc<dyn KeyValueStore>,
    base_url: String,
}

fn build_http_client() -> Result<Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("hexagon-client/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

impl Hexagon {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        monitor: Arc<ConnectionMonitor>,
        notifier: Arc<dyn Notifier>,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let http = build_http_client()?;
        let reauth = Arc::new(HttpReauthenticator::new(http.clone(), base_url));
        Self::from_parts(http, store, monitor, notifier, reauth, base_url)
    }

    /// 使用自定义的重新登录实现
    pub fn with_reauthenticator(
        store: Arc<dyn KeyValueStore>,
        monitor: Arc<ConnectionMonitor>,
        notifier: Arc<dyn Notifier>,
        reauth: Arc<dyn Reauthenticator>,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let http = build_http_client()?;
        Self::from_parts(http, store, monitor, notifier, reauth, base_url)
    }

    fn from_parts(
        http: Client,
        store: Arc<dyn KeyValueStore>,
        monitor: Arc<ConnectionMonitor>,
        notifier: Arc<dyn Notifier>,
        reauth: Arc<dyn Reauthenticator>,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let client = ClientBuilder::new(http)
            .with(SessionMiddleware::new(monitor, store.clone(), reauth, notifier))
            .with(AuthHeaderMiddleware::from_store(store.clone()))
            .build();

        Ok(Hexagon {
            client,
            store,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 当前保存的登录信息
    pub fn session(&self) -> Result<LoginSession, ClientError> {
        schema::read_entity::<LoginSession>(&*self.store, keys::LOGIN_INFO)?
            .ok_or_else(ClientError::not_logged_in)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, ClientError> {
        let response = self
            .client
            .post(self.url("/login"))
            .with_extension(SkipRelogin)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::unauthorized());
        }
        let data: LoginResponse = response.json().await?;
        let message = data.message.clone();
        let Some(grant) = data.into_grant() else {
            return Err(ClientError::api(
                message.unwrap_or_else(|| "登录失败，请检查用户名和密码".to_string()),
            ));
        };

        let session = LoginSession::new(username, password, grant);
        schema::write_entity(&*self.store, keys::LOGIN_INFO, &session)?;
        info!("logged in as {}", username);
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.store.remove_item(keys::LOGIN_INFO)
    }

    /// 访问服务根路径，确认服务可达
    pub async fn ping(&self) -> Result<Value, ClientError> {
        let response = self.client.get(self.url("/")).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::unauthorized());
        }
        if !status.is_success() {
            return Err(ClientError::new(
                ErrorKind::Http,
                format!("请求失败，状态码: {}", status.as_u16()),
            ));
        }
        let data: Value = response.json().await?;
        Ok(data)
    }

    async fn send(&self, builder: reqwest_middleware::RequestBuilder) -> Result<ApiResponse, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::unauthorized());
        }

        let body = response.bytes().await?;
        let data: ApiResponse = match serde_json::from_slice(&body) {
            Ok(data) => data,
            Err(err) if status.is_success() => {
                return Err(ClientError::new(
                    ErrorKind::Http,
                    format!("无法解析响应: {}", err),
                ));
            }
            Err(_) => {
                return Err(ClientError::new(
                    ErrorKind::Http,
                    format!("请求失败，状态码: {}", status.as_u16()),
                ));
            }
        };

        if !data.success {
            return Err(ClientError::api(data.message_or("请求失败")));
        }
        debug!("{} ok", status);
        Ok(data)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse, ClientError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn select_class(&self, request: &SelectionRequest) -> Result<ApiResponse, ClientError> {
        self.post("/select-class", request).await
    }

    pub async fn drop_class(&self, request: &SelectionRequest) -> Result<ApiResponse, ClientError> {
        self.post("/drop-class", request).await
    }

    pub async fn get_batches(&self) -> Result<Value, ClientError> {
        let session = self.session()?;
        let body = json!({ "username": session.username, "password": session.password });
        let data = self.post("/get-batches", &body).await?;
        Ok(data.data.unwrap_or(Value::Null))
    }

    pub async fn get_sys_params(&self) -> Result<Value, ClientError> {
        let session = self.session()?;
        let body = json!({ "username": session.username, "password": session.password });
        let data = self.post("/get-sys-params", &body).await?;
        Ok(data.data.unwrap_or(Value::Null))
    }

    pub async fn get_courses(&self, query: &CourseQuery) -> Result<Value, ClientError> {
        let data = self.post("/get-courses", query).await?;
        Ok(data.data.unwrap_or(Value::Null))
    }

    /// 启动服务端轮询抢课，返回任务 id
    pub async fn start_grab_course(&self, request: &GrabRequest) -> Result<String, ClientError> {
        let data = self.post("/start-grab-course", request).await?;
        data.task_id
            .ok_or_else(|| ClientError::new(ErrorKind::Http, "响应缺少 task_id"))
    }

    pub async fn stop_grab_course(&self, task_id: &str) -> Result<(), ClientError> {
        self.post("/stop-grab-course", &json!({ "task_id": task_id }))
            .await
            .map(|_| ())
    }

    pub async fn grab_course_status(&self, task_id: &str) -> Result<Value, ClientError> {
        let builder = self
            .client
            .get(self.url(&format!("/grab-course-status/{}", task_id)));
        let data = self.send(builder).await?;
        Ok(data.data.unwrap_or(Value::Null))
    }
}
