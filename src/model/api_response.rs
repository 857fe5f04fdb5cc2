use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::login_session::LoginGrant;

/// `/login` 的响应
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginResponse {
    #[serde(rename = "success")]
    pub success: bool,

    #[serde(rename = "message", default)]
    pub message: Option<String>,

    #[serde(rename = "token", default)]
    pub token: Option<String>,

    #[serde(rename = "WEU", default)]
    pub weu: Option<String>,

    #[serde(rename = "JSESSIONID", default)]
    pub jsessionid: Option<String>,
}

impl LoginResponse {
    /// 只有 `success` 为真且带有 token 时才算登录成功
    pub fn into_grant(self) -> Option<LoginGrant> {
        if !self.success {
            return None;
        }
        let token = self.token.filter(|token| !token.is_empty())?;
        Some(LoginGrant {
            token,
            weu: self.weu.unwrap_or_default(),
            jsessionid: self.jsessionid.unwrap_or_default(),
        })
    }
}

/// 其余接口的通用响应，选课/退课把结果放在 `result`，查询类接口放在 `data`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiResponse {
    #[serde(rename = "success")]
    pub success: bool,

    #[serde(rename = "message", default)]
    pub message: Option<String>,

    #[serde(rename = "data", alias = "result", default)]
    pub data: Option<Value>,

    #[serde(rename = "task_id", default)]
    pub task_id: Option<String>,
}

impl ApiResponse {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejected_login_yields_no_grant() {
        let response: LoginResponse =
            serde_json::from_value(json!({"success": false, "message": "登录失败"})).unwrap();
        assert!(response.into_grant().is_none());

        let response: LoginResponse =
            serde_json::from_value(json!({"success": true, "token": ""})).unwrap();
        assert!(response.into_grant().is_none());
    }

    #[test]
    fn result_field_is_read_as_data() {
        let response: ApiResponse = serde_json::from_value(
            json!({"success": true, "message": "选课成功！", "result": {"code": "1"}}),
        )
        .unwrap();
        assert_eq!(response.data, Some(json!({"code": "1"})));
    }
}
