use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::error::client::ClientError;
use crate::model::api_response::LoginResponse;

/// 自动重新登录时使用的登录调用
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError>;
}

/// 直接用底层 HTTP 客户端调用 `POST {base}/login`，不经过会话中间件
pub struct HttpReauthenticator {
    client: Client,
    base_url: String,
}

impl HttpReauthenticator {
    pub fn new(client: Client, base_url: &str) -> Self {
        HttpReauthenticator {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Reauthenticator for HttpReauthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::unauthorized());
        }
        let data: LoginResponse = response.json().await?;
        Ok(data)
    }
}
