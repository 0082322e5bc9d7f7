use serde::{Deserialize, Serialize};

use super::repo_types::UserId;

/// Body of `POST /api/register`. Every field is optional on the wire so that
/// absent fields reach the service check instead of failing deserialization.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<Age>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Age arrives as a JSON number or a numeric string; it is stored as text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Age {
    Number(serde_json::Number),
    Text(String),
}

impl Age {
    pub fn into_text(self) -> String {
        match self {
            Age::Number(n) => n.to_string(),
            Age::Text(s) => s,
        }
    }
}

/// Envelope returned by the registration endpoint, for success and failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterReply {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl RegisterReply {
    pub fn registered(user_id: UserId) -> Self {
        Self {
            success: true,
            message: "Registration successful".into(),
            user_id: Some(user_id),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            user_id: None,
        }
    }
}
