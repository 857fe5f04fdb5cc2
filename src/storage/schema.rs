//! 持久化实体的版本化封装。
//!
//! 每个 JSON 实体写成 `{"version": N, "data": ...}`。早期版本直接保存裸 JSON，
//! 读取时视为版本 0，迁移到当前版本后立即写回。比当前版本更新的数据无法解读，
//! 按读取失败处理。

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::client::ClientError;
use crate::storage::local_store::KeyValueStore;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug)]
struct Envelope<T> {
    version: u32,
    data: T,
}

// 逐版本迁移；版本 0 到 1 只是加上外层封装，数据形状不变
fn migrate(key: &str, mut version: u32, mut data: Value) -> Result<Value, ClientError> {
    while version < CURRENT_VERSION {
        data = match version {
            0 => data,
            other => {
                return Err(ClientError::storage(format!(
                    "{} 没有从版本 {} 出发的迁移",
                    key, other
                )));
            }
        };
        version += 1;
    }
    Ok(data)
}

fn split_envelope(value: Value) -> (u32, Value) {
    match value {
        Value::Object(mut map) if map.len() == 2 && map.contains_key("data") => {
            match map.get("version").and_then(Value::as_u64) {
                Some(version) => {
                    let data = map.remove("data").unwrap_or(Value::Null);
                    (u32::try_from(version).unwrap_or(u32::MAX), data)
                }
                None => (0, Value::Object(map)),
            }
        }
        other => (0, other),
    }
}

/// 读取并解码 `key` 下的实体；键不存在时返回 `Ok(None)`
pub fn read_entity<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, ClientError>
where
    T: DeserializeOwned + Serialize,
{
    let Some(raw) = store.get_item(key)? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&raw)?;
    let (version, data) = split_envelope(value);

    if version > CURRENT_VERSION {
        return Err(ClientError::storage(format!(
            "{} 的数据版本 {} 高于当前支持的版本 {}",
            key, version, CURRENT_VERSION
        )));
    }

    let data = migrate(key, version, data)?;
    let entity: T = serde_json::from_value(data)?;

    if version < CURRENT_VERSION {
        info!("{} 已从版本 {} 迁移到版本 {}", key, version, CURRENT_VERSION);
        if let Err(err) = write_entity(store, key, &entity) {
            warn!("写回迁移后的 {} 失败: {}", key, err);
        }
    }
    Ok(Some(entity))
}

pub fn write_entity<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    entity: &T,
) -> Result<(), ClientError> {
    let envelope = Envelope {
        version: CURRENT_VERSION,
        data: entity,
    };
    let text = serde_json::to_string(&envelope)?;
    store.set_item(key, &text)
}
