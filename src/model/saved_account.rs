use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedAccount {
    pub username: String,
    pub password: String,
    /// 保存时间戳（毫秒）
    pub saved_at: i64,
}
