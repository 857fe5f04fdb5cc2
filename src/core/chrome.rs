//! 窗口外壳与界面之间的消息通道。窗口本身由宿主实现，这里只定义边界。

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeRequest {
    Minimize,
    ToggleMaximize,
    IsMaximized,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeNotification {
    Maximized,
    Unmaximized,
    WillClose,
}

impl ChromeRequest {
    pub fn channel(self) -> &'static str {
        match self {
            ChromeRequest::Minimize => "window-minimize",
            ChromeRequest::ToggleMaximize => "window-maximize",
            ChromeRequest::IsMaximized => "window-is-maximized",
            ChromeRequest::Close => "window-close",
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        [
            ChromeRequest::Minimize,
            ChromeRequest::ToggleMaximize,
            ChromeRequest::IsMaximized,
            ChromeRequest::Close,
        ]
        .into_iter()
        .find(|request| request.channel() == channel)
    }
}

impl ChromeNotification {
    pub fn channel(self) -> &'static str {
        match self {
            ChromeNotification::Maximized => "window-maximized",
            ChromeNotification::Unmaximized => "window-unmaximized",
            ChromeNotification::WillClose => "window-will-close",
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        [
            ChromeNotification::Maximized,
            ChromeNotification::Unmaximized,
            ChromeNotification::WillClose,
        ]
        .into_iter()
        .find(|notification| notification.channel() == channel)
    }
}

#[async_trait]
pub trait WindowChrome: Send + Sync {
    async fn minimize(&self);

    /// 已最大化时还原，否则最大化
    async fn toggle_maximize(&self);

    async fn is_maximized(&self) -> bool;

    async fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeReply {
    Done,
    Maximized(bool),
}

pub async fn dispatch(chrome: &dyn WindowChrome, request: ChromeRequest) -> ChromeReply {
    match request {
        ChromeRequest::Minimize => chrome.minimize().await,
        ChromeRequest::ToggleMaximize => chrome.toggle_maximize().await,
        ChromeRequest::IsMaximized => return ChromeReply::Maximized(chrome.is_maximized().await),
        ChromeRequest::Close => chrome.close().await,
    }
    ChromeReply::Done
}
