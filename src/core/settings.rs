use std::path::PathBuf;

use log::warn;
use url::Url;

use crate::error::client::{ClientError, ErrorKind};
use crate::storage::local_store::{KeyValueStore, keys};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DATA_DIR_ENV: &str = "HEXAGON_DATA_DIR";
pub const STORE_FILE_NAME: &str = "local_storage.json";

/// 命令行参数优先，其次环境变量，再次系统数据目录
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|dir| dir.join("hexagon"))
        .unwrap_or_else(|| PathBuf::from(".hexagon"))
}

pub fn store_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

pub fn normalize_api_url(raw: &str) -> Result<String, ClientError> {
    let raw = raw.trim();
    let url = Url::parse(raw)
        .map_err(|err| ClientError::new(ErrorKind::Other, format!("无效的 API 地址 {}: {}", raw, err)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::new(
            ErrorKind::Other,
            format!("API 地址必须是 http 或 https: {}", raw),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

pub fn api_base_url(store: &dyn KeyValueStore) -> String {
    match store.get_item(keys::API_URL) {
        Ok(Some(url)) if !url.trim().is_empty() => url,
        Ok(_) => DEFAULT_API_URL.to_string(),
        Err(err) => {
            warn!("Failed to read apiUrl: {}", err);
            DEFAULT_API_URL.to_string()
        }
    }
}

pub fn set_api_base_url(store: &dyn KeyValueStore, raw: &str) -> Result<String, ClientError> {
    let url = normalize_api_url(raw)?;
    store.set_item(keys::API_URL, &url)?;
    Ok(url)
}
