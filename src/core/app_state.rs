use std::sync::Arc;

use log::warn;

use crate::core::accounts::AccountBook;
use crate::core::connection::ConnectionMonitor;
use crate::core::course_queue::CourseQueue;
use crate::core::hexagon::Hexagon;
use crate::core::notify::Notifier;
use crate::core::route::{self, Navigation, Route};
use crate::core::settings;
use crate::core::theme::ThemeController;
use crate::error::client::ClientError;
use crate::storage::local_store::KeyValueStore;

/// 应用的全部状态，由调用方持有并按引用传给各个操作
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
    pub monitor: Arc<ConnectionMonitor>,
    pub accounts: AccountBook,
    pub queue: CourseQueue,
    pub theme: ThemeController,
}

impl AppState {
    pub fn init(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let monitor = Arc::new(ConnectionMonitor::new());
        monitor.init_from_store(&*store);

        let mut theme = ThemeController::new(store.clone());
        theme.init();

        AppState {
            accounts: AccountBook::load(store.clone()),
            queue: CourseQueue::load(store.clone(), notifier.clone()),
            theme,
            monitor,
            notifier,
            store,
        }
    }

    /// 清空本地存储并把所有状态恢复到初始值
    pub fn reset(&mut self) {
        if let Err(err) = self.store.clear() {
            warn!("Failed to clear local storage: {}", err);
        }
        self.monitor.reset();
        self.accounts.reload();
        self.queue.reload();
        self.theme.init();
    }

    pub fn api_base_url(&self) -> String {
        settings::api_base_url(&*self.store)
    }

    /// 构造 API 客户端；`base_url` 为空时使用保存的地址
    pub fn hexagon(&self, base_url: Option<&str>) -> Result<Hexagon, ClientError> {
        let base_url = match base_url {
            Some(url) => settings::normalize_api_url(url)?,
            None => self.api_base_url(),
        };
        Hexagon::new(
            self.store.clone(),
            self.monitor.clone(),
            self.notifier.clone(),
            &base_url,
        )
    }

    pub fn navigate(&self, target: Route) -> Navigation {
        route::guard(target, &*self.store)
    }
}
