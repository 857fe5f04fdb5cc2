//! 连接状态与自动重新登录的重入保护。
//!
//! 状态只由 HTTP 中间件的响应结果驱动，界面层只读。

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::storage::local_store::{KeyValueStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct MonitorState {
    status: ConnectionStatus,
    reconnecting: bool,
}

#[derive(Debug)]
pub struct ConnectionMonitor {
    state: Mutex<MonitorState>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        ConnectionMonitor {
            state: Mutex::new(MonitorState {
                status: ConnectionStatus::Disconnected,
                reconnecting: false,
            }),
        }
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 启动时根据是否保存了登录信息给出初始状态
    pub fn init_from_store(&self, store: &dyn KeyValueStore) {
        let logged_in = matches!(store.get_item(keys::LOGIN_INFO), Ok(Some(ref info)) if !info.is_empty());
        let mut state = self.lock();
        state.status = if logged_in {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        state.reconnecting = false;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    pub fn is_reconnecting(&self) -> bool {
        self.lock().reconnecting
    }

    /// 请求成功。重入保护只由持有它的那次重新登录释放
    pub fn on_success(&self) {
        let mut state = self.lock();
        if state.status != ConnectionStatus::Connected {
            debug!("connection restored");
            state.status = ConnectionStatus::Connected;
        }
    }

    /// 请求发出但没有收到任何响应
    pub fn on_network_failure(&self) {
        self.lock().status = ConnectionStatus::Disconnected;
    }

    /// 收到非 401 的错误响应，请求到达了服务端，视为连接正常
    pub fn on_error_response(&self) {
        self.lock().status = ConnectionStatus::Connected;
    }

    /// 检查并设置重入保护。已有重新登录在进行时返回 `None`
    pub fn try_begin_relogin(&self) -> Option<ReloginGuard<'_>> {
        let mut state = self.lock();
        if state.reconnecting {
            return None;
        }
        state.reconnecting = true;
        state.status = ConnectionStatus::Reconnecting;
        info!("session expired, reconnecting");
        Some(ReloginGuard {
            monitor: self,
            finished: false,
        })
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.status = ConnectionStatus::Disconnected;
        state.reconnecting = false;
    }
}

/// 持有期间其他 401 不会再触发重新登录；释放时清除重入保护
#[must_use]
pub struct ReloginGuard<'a> {
    monitor: &'a ConnectionMonitor,
    finished: bool,
}

impl ReloginGuard<'_> {
    pub fn finish(mut self, succeeded: bool) {
        let mut state = self.monitor.lock();
        state.status = if succeeded {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        state.reconnecting = false;
        self.finished = true;
    }
}

impl Drop for ReloginGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 重新登录的 future 被中途丢弃
        let mut state = self.monitor.lock();
        state.reconnecting = false;
        if state.status == ConnectionStatus::Reconnecting {
            state.status = ConnectionStatus::Disconnected;
        }
    }
}
