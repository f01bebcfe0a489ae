// 認証機能のデータモデル

use serde::{Deserialize, Serialize};

/// ログイン中のユーザー
///
/// セッション状態が所有し、ログイン・登録時に作成、ログアウト時に破棄される。
/// `role`は承認機能のUI出し分けにのみ使う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub last_login: Option<String>,
}

impl SessionUser {
    /// レポート承認操作が許可されているかを判定
    ///
    /// # 戻り値
    /// manager または admin の場合はtrue
    pub fn can_review_reports(&self) -> bool {
        matches!(self.role.as_deref(), Some("manager") | Some("admin"))
    }
}

/// POST /users/create リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// POST /users/create レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "isActive", default)]
    pub is_active: Option<bool>,
    #[serde(rename = "lastLogin", default)]
    pub last_login: Option<String>,
}

impl From<CreateUserResponse> for SessionUser {
    fn from(response: CreateUserResponse) -> Self {
        SessionUser {
            id: response.id,
            name: response.name,
            email: response.email,
            created_at: response.created_at,
            role: response.role,
            is_active: response.is_active,
            last_login: response.last_login,
        }
    }
}

/// POST /users/login リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /users/login レスポンスのユーザーレコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUserRecord {
    pub user_id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "lastLogin", default)]
    pub last_login: Option<String>,
    #[serde(rename = "isActive", default)]
    pub is_active: Option<bool>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

/// POST /users/login レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: LoginUserRecord,
}

impl From<LoginUserRecord> for SessionUser {
    fn from(record: LoginUserRecord) -> Self {
        SessionUser {
            id: record.user_id,
            name: record.username,
            email: record.email,
            created_at: record.created_at,
            role: record.role,
            is_active: record.is_active,
            last_login: record.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_user(role: Option<&str>) -> SessionUser {
        SessionUser {
            id: "u1".to_string(),
            name: "Taro".to_string(),
            email: "taro@example.com".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            role: role.map(|r| r.to_string()),
            is_active: Some(true),
            last_login: None,
        }
    }

    #[test]
    fn test_can_review_reports() {
        assert!(!plain_user(None).can_review_reports());
        assert!(!plain_user(Some("user")).can_review_reports());
        assert!(plain_user(Some("manager")).can_review_reports());
        assert!(plain_user(Some("admin")).can_review_reports());
    }

    #[test]
    fn test_login_response_wire_names() {
        // ログイン応答はuser_idのみsnake_case、他はcamelCaseという混在契約
        let json = r#"{
            "user": {
                "user_id": "u1",
                "username": "taro",
                "email": "taro@example.com",
                "role": "manager",
                "lastLogin": "2024-05-01T09:00:00+00:00",
                "isActive": true,
                "createdAt": "2024-01-01T00:00:00+00:00"
            }
        }"#;

        let response: LoginResponse = serde_json::from_str(json).unwrap();
        let user: SessionUser = response.user.into();

        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "taro");
        assert_eq!(user.role.as_deref(), Some("manager"));
        assert_eq!(user.is_active, Some(true));
        assert_eq!(user.created_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_create_user_response_conversion() {
        let json = r#"{
            "id": "u2",
            "name": "Hanako",
            "email": "hanako@example.com",
            "createdAt": "2024-02-01T00:00:00+00:00"
        }"#;

        let response: CreateUserResponse = serde_json::from_str(json).unwrap();
        let user: SessionUser = response.into();

        assert_eq!(user.id, "u2");
        assert_eq!(user.name, "Hanako");
        assert_eq!(user.role, None);
    }
}
