//! The persisted representation of a logged-in user.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as returned by `auth/login`.
///
/// The whole login response body is kept: fields the client does not model
/// are carried in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Bearer token for authenticated calls
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    /// Builds a record from a login response body.
    ///
    /// Returns `None` unless the body carries a non-empty `accessToken`.
    pub fn from_response(body: &Value) -> Option<Self> {
        serde_json::from_value::<Self>(body.clone())
            .ok()
            .filter(Self::is_valid)
    }

    /// A record is only usable with a non-empty access token.
    pub fn is_valid(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Label used for the profile link: name, then email, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Profile")
    }

    pub fn masked_token(&self) -> String {
        mask_token(&self.access_token)
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(12) {
        Some((idx, _)) if token.chars().count() > 16 => format!("{}...", &token[..idx]),
        _ => "***".to_string(),
    }
}
