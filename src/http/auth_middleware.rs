use std::sync::Arc;

use http::Extensions;
use log::warn;
use reqwest::{Request, Response, header::HeaderValue};
use reqwest_middleware::{Middleware, Next, Result};

use crate::model::login_session::LoginSession;
use crate::storage::local_store::{KeyValueStore, keys};
use crate::storage::schema;

pub const TOKEN_HEADER: &str = "token";

/// 给每个请求带上当前会话的 token。token 在发送时读取，重放的请求会带上刷新后的值
pub struct AuthHeaderMiddleware {
    pub token_fn: Arc<dyn Fn() -> Option<String> + Send + Sync>,
}

impl AuthHeaderMiddleware {
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        AuthHeaderMiddleware {
            token_fn: Arc::new(move || {
                schema::read_entity::<LoginSession>(&*store, keys::LOGIN_INFO)
                    .ok()
                    .flatten()
                    .map(|session| session.token)
                    .filter(|token| !token.is_empty())
            }),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthHeaderMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(token) = (self.token_fn)() {
            match HeaderValue::from_str(&token) {
                Ok(value) => {
                    req.headers_mut().insert(TOKEN_HEADER, value);
                }
                Err(err) => warn!("token 含有非法字符，未附加: {}", err),
            }
        }
        next.run(req, extensions).await
    }
}
