use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

//  ROLES

/// Well-known portal roles. Role names stay an open set: the session and
/// allow-lists carry plain strings, this enum only names the common ones.
#[derive(
    Debug, Serialize, Deserialize, Display, EnumString, AsRefStr, PartialEq, Eq, Hash, Clone, Copy,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PortalRole {
    Admin,
    Trainer,
    Student,
}

//  TOKEN CLAIMS

/// Identity claims carried by a login token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub specialty: Option<String>,
    pub exp: i64, // Expiration timestamp, seconds since epoch
}

//  SESSION CREDENTIALS

/// What the credential store holds for the current browser session.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<i64>,
}

impl Credentials {
    pub fn new(token: impl Into<String>, role: impl Into<String>) -> Self {
        Credentials {
            token: Some(token.into()),
            role: Some(role.into()),
            expires_at: None,
        }
    }

    pub fn from_claims(token: impl Into<String>, claims: &Claims) -> Self {
        Credentials {
            token: Some(token.into()),
            role: Some(claims.role.clone()),
            expires_at: Some(claims.exp),
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.role.is_none()
    }
}

//  IDENTITY SERVICE

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginResponse {
    pub token: String,
}

//  CONFIGURATION SERVICE

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Configuration {
    pub id: String,
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfigurationUpdate {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
