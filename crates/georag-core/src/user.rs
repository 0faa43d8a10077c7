//! REST wire types for the user API (`/api/v1/users`)

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/users/login`
///
/// `account` may be a username, e-mail address or phone number.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub account: String,
    pub password: String,
}

/// Successful login: the JWT plus a minimal profile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResult {
    pub token: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Account details returned by `GET /api/v1/users/profile`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub gender_desc: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub status_desc: Option<String>,
    /// Server-formatted, e.g. `2026-01-06 10:00:00`
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub settings: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Remaining question credits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    pub quota: i64,
    #[serde(default)]
    pub quota_desc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ApiResponse;
    use crate::error::ClientError;

    #[test]
    fn test_login_request_body() {
        let body = LoginRequest {
            account: "geo@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"account":"geo@example.com","password":"secret123"}"#
        );
    }

    #[test]
    fn test_login_envelope() {
        let json = r#"{"code":200,"msg":"success","data":{"token":"eyJ.a.b","nickname":"Loess","avatar":null},"timestamp":1767664800000}"#;
        let response: ApiResponse<LoginResult> = serde_json::from_str(json).unwrap();
        let login = response.into_data().unwrap();
        assert_eq!(login.token, "eyJ.a.b");
        assert_eq!(login.nickname, "Loess");
        assert_eq!(login.avatar, None);
    }

    #[test]
    fn test_login_rejected_envelope() {
        let json = r#"{"code":401,"msg":"wrong account or password","data":null}"#;
        let response: ApiResponse<LoginResult> = serde_json::from_str(json).unwrap();
        match response.into_data() {
            Err(ClientError::Api { code, msg }) => {
                assert_eq!(code, 401);
                assert_eq!(msg, "wrong account or password");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_profile_envelope() {
        let json = r#"{"code":200,"msg":"success","data":{
            "username":"loess","nickname":"Loess","email":"geo@example.com",
            "gender":1,"genderDesc":"male","region":"Shaanxi","status":0,
            "statusDesc":"normal","createTime":"2026-01-06 10:00:00",
            "settings":{"theme":"dark"}}}"#;
        let response: ApiResponse<UserProfile> = serde_json::from_str(json).unwrap();
        let profile = response.into_data().unwrap();
        assert_eq!(profile.username, "loess");
        assert_eq!(profile.gender_desc.as_deref(), Some("male"));
        assert_eq!(profile.create_time.as_deref(), Some("2026-01-06 10:00:00"));
        assert_eq!(profile.phone, None);
        assert_eq!(
            profile.settings.unwrap().get("theme"),
            Some(&serde_json::json!("dark"))
        );
    }

    #[test]
    fn test_quota_envelope() {
        let json = r#"{"code":200,"msg":"success","data":{"quota":42,"quotaDesc":"42 questions left"}}"#;
        let response: ApiResponse<Quota> = serde_json::from_str(json).unwrap();
        let quota = response.into_data().unwrap();
        assert_eq!(quota.quota, 42);
        assert_eq!(quota.quota_desc.as_deref(), Some("42 questions left"));
    }
}
