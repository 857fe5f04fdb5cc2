//! 本地键值存储，语义与浏览器 `localStorage` 相同：字符串键对应字符串值。
//!
//! `FileStore` 把全部条目保存在一个 JSON 文件里，每次写入都整体落盘；
//! `MemoryStore` 只存在于内存中，用于测试。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::warn;

use crate::error::client::ClientError;

/// 固定的存储键
pub mod keys {
    pub const SAVED_ACCOUNTS: &str = "savedAccounts";
    pub const COURSE_QUEUE: &str = "courseQueue";
    pub const THEME: &str = "theme";
    pub const LOGIN_INFO: &str = "loginInfo";
    pub const API_URL: &str = "apiUrl";
}

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, ClientError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError>;

    fn remove_item(&self, key: &str) -> Result<(), ClientError>;

    fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ClientError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.clear();
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// 打开存储文件；文件不存在时从空存储开始，文件损坏时记录警告并使用空存储
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let items = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text).unwrap_or_else(|err| {
                    warn!("警告: 加载本地存储失败，使用默认值: {}: {}", path.display(), err);
                    BTreeMap::new()
                })
            }
        } else {
            BTreeMap::new()
        };

        Ok(FileStore {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // 先写临时文件再重命名，写到一半不会留下损坏的存储文件
    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let text = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ClientError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.clear();
        self.flush(&items)
    }
}
