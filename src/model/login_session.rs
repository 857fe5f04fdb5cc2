use serde::{Deserialize, Serialize};

/// 持久化在 `loginInfo` 下的登录信息，每次登录或自动重新登录后整体覆盖
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginSession {
    pub username: String,
    pub password: String,

    #[serde(default)]
    pub token: String,

    #[serde(rename = "WEU", default)]
    pub weu: String,

    #[serde(rename = "JSESSIONID", default)]
    pub jsessionid: String,
}

/// 一次成功登录下发的会话标识
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    pub token: String,
    pub weu: String,
    pub jsessionid: String,
}

impl LoginSession {
    pub fn new(username: &str, password: &str, grant: LoginGrant) -> Self {
        LoginSession {
            username: username.to_string(),
            password: password.to_string(),
            token: grant.token,
            weu: grant.weu,
            jsessionid: grant.jsessionid,
        }
    }

    /// 用新的会话标识替换旧的，账号密码保持不变
    pub fn refreshed(&self, grant: LoginGrant) -> Self {
        LoginSession::new(&self.username, &self.password, grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_server_field_names() {
        let session = LoginSession::new(
            "20231120",
            "secret",
            LoginGrant {
                token: "t".into(),
                weu: "w".into(),
                jsessionid: "j".into(),
            },
        );
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["WEU"], "w");
        assert_eq!(json["JSESSIONID"], "j");

        let refreshed = session.refreshed(LoginGrant {
            token: "t2".into(),
            weu: "w2".into(),
            jsessionid: "j2".into(),
        });
        assert_eq!(refreshed.username, "20231120");
        assert_eq!(refreshed.password, "secret");
        assert_eq!(refreshed.token, "t2");
    }
}
