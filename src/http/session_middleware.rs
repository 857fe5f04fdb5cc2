//! 会话中间件：维护连接状态，并在 401 时自动重新登录、重放原请求一次。
//!
//! 中间件链中它必须排在 [`AuthHeaderMiddleware`](crate::http::auth_middleware::AuthHeaderMiddleware)
//! 之前，重放的请求才会重新经过 token 注入。

use std::sync::Arc;

use http::Extensions;
use log::{debug, info, warn};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};

use crate::core::connection::ConnectionMonitor;
use crate::core::notify::Notifier;
use crate::http::reauth::Reauthenticator;
use crate::model::login_session::LoginSession;
use crate::storage::local_store::{KeyValueStore, keys};
use crate::storage::schema;

/// 请求扩展标记：带有此标记的请求收到 401 时不触发自动重新登录（如登录请求本身）
#[derive(Debug, Clone, Copy)]
pub struct SkipRelogin;

pub struct SessionMiddleware {
    monitor: Arc<ConnectionMonitor>,
    store: Arc<dyn KeyValueStore>,
    reauth: Arc<dyn Reauthenticator>,
    notifier: Arc<dyn Notifier>,
}

impl SessionMiddleware {
    pub fn new(
        monitor: Arc<ConnectionMonitor>,
        store: Arc<dyn KeyValueStore>,
        reauth: Arc<dyn Reauthenticator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        SessionMiddleware {
            monitor,
            store,
            reauth,
            notifier,
        }
    }

    fn record(&self, outcome: &Result<Response>) {
        match outcome {
            Ok(response) if response.status().is_success() || response.status().is_redirection() => {
                self.monitor.on_success();
            }
            Ok(response) => {
                debug!("{} -> {}", response.url(), response.status());
                self.monitor.on_error_response();
            }
            Err(reqwest_middleware::Error::Reqwest(err)) => {
                debug!("request failed without response: {}", err);
                self.monitor.on_network_failure();
            }
            Err(reqwest_middleware::Error::Middleware(_)) => {}
        }
    }

    /// 用保存的账号密码重新登录，成功后写回新的会话标识
    async fn relogin(&self) -> Option<LoginSession> {
        let session = match schema::read_entity::<LoginSession>(&*self.store, keys::LOGIN_INFO) {
            Ok(Some(session)) => session,
            Ok(None) => {
                info!("no saved login, cannot re-authenticate");
                return None;
            }
            Err(err) => {
                warn!("Failed to read loginInfo: {}", err);
                return None;
            }
        };

        let response = match self.reauth.login(&session.username, &session.password).await {
            Ok(response) => response,
            Err(err) => {
                warn!("自动重新登录失败: {}", err);
                return None;
            }
        };
        let message = response.message.clone();
        let Some(grant) = response.into_grant() else {
            warn!("自动重新登录被拒绝: {}", message.unwrap_or_default());
            return None;
        };

        let refreshed = session.refreshed(grant);
        if let Err(err) = schema::write_entity(&*self.store, keys::LOGIN_INFO, &refreshed) {
            warn!("Failed to save refreshed loginInfo: {}", err);
        }
        Some(refreshed)
    }

    fn drop_session(&self) {
        if let Err(err) = self.store.remove_item(keys::LOGIN_INFO) {
            warn!("Failed to remove loginInfo: {}", err);
        }
    }
}

#[async_trait::async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let replay = req.try_clone();
        let outcome = next.clone().run(req, extensions).await;

        let response = match outcome {
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => response,
            other => {
                self.record(&other);
                return other;
            }
        };

        if extensions.get::<SkipRelogin>().is_some() {
            self.monitor.on_error_response();
            return Ok(response);
        }

        // 已有重新登录在进行，直接返回原始 401
        let Some(guard) = self.monitor.try_begin_relogin() else {
            debug!("relogin already in flight, failing {}", response.url());
            return Ok(response);
        };

        match self.relogin().await {
            Some(session) => {
                guard.finish(true);
                info!("re-authenticated as {}", session.username);
                self.notifier.success("已自动重新登录");
            }
            None => {
                guard.finish(false);
                self.drop_session();
                self.notifier.error("登录已过期，请重新登录");
                return Ok(response);
            }
        }

        let Some(replay) = replay else {
            warn!("request body cannot be cloned, not replaying {}", response.url());
            return Ok(response);
        };

        // 重放只走内层中间件，不会再次触发重新登录
        let outcome = next.run(replay, extensions).await;
        self.record(&outcome);
        outcome
    }
}
