use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

/// 错误类别，调用方据此区分会话失效、网络不可达与服务端业务错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 服务端返回 401
    Unauthorized,
    /// 请求未收到任何响应
    Network,
    /// 非 401 的 HTTP 错误响应，或响应体无法解析
    Http,
    /// 服务端返回 `success: false`
    Api,
    /// 本地存储读写失败
    Storage,
    /// 本地没有登录信息
    NotLoggedIn,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Api => "api",
            ErrorKind::Storage => "storage",
            ErrorKind::NotLoggedIn => "not logged in",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ClientError {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn unauthorized() -> Self {
        ClientError::new(ErrorKind::Unauthorized, "登录已过期，请重新登录")
    }

    pub fn not_logged_in() -> Self {
        ClientError::new(ErrorKind::NotLoggedIn, "尚未登录，请先登录")
    }

    pub fn api(message: impl Into<String>) -> Self {
        ClientError::new(ErrorKind::Api, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ClientError::new(ErrorKind::Storage, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取内部错误（如果有）
    pub fn source_error(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientError({}): {}", self.kind, self.message)
    }
}

fn classify_reqwest(err: &reqwest::Error) -> ErrorKind {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        ErrorKind::Network
    } else {
        ErrorKind::Http
    }
}

fn classify(err: &(dyn Any + 'static)) -> ErrorKind {
    if let Some(err) = err.downcast_ref::<reqwest_middleware::Error>() {
        return match err {
            reqwest_middleware::Error::Reqwest(inner) => classify_reqwest(inner),
            reqwest_middleware::Error::Middleware(_) => ErrorKind::Other,
        };
    }
    if let Some(err) = err.downcast_ref::<reqwest::Error>() {
        return classify_reqwest(err);
    }
    if err.is::<std::io::Error>() || err.is::<serde_json::Error>() {
        return ErrorKind::Storage;
    }
    ErrorKind::Other
}

// 为所有实现了 Error 的类型实现 From<T>，类别按原始错误类型推断
impl<E: StdError + Send + Sync + 'static> From<E> for ClientError {
    fn from(err: E) -> Self {
        ClientError {
            kind: classify(&err),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
