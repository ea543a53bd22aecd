//! # Boundary data model
//!
//! Types exchanged with the hosted platform. They are `Serialize + Deserialize` in
//! the platform's own JSON shape so the HTTP client can decode responses directly,
//! and `Clone + PartialEq` so the UI can keep them in signals.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Session`] | Access/refresh token pair plus the signed-in [`AuthUser`]. |
//! | [`AuthUser`] | The user record: id, e-mail and free-form [`UserMetadata`]. |
//! | [`UserMetadata`] | Profile fields the app edits (`avatar_url`, `username`, `dob`); unknown keys are kept in `extra`. |
//! | [`MetadataPatch`] | A partial update: only the keys it carries are overwritten. |
//! | [`UploadedObject`] | Storage key returned by an upload. |
//! | [`SessionChange`] | What subscribers receive whenever the session changes. |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated session held by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp (seconds) after which the access token is no longer valid.
    pub expires_at: i64,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Whether the token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs >= self.expires_at
    }
}

/// The user record attached to a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata stored on the user record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Storage key of the avatar inside the avatars bucket.
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Date of birth as entered in the form (`YYYY-MM-DD`).
    #[serde(default)]
    pub dob: Option<String>,
    /// Keys this app does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A partial metadata update.
///
/// Keys present in the patch overwrite the stored value; an explicit `null`
/// clears it. Keys not present are left alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataPatch(Map<String, Value>);

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avatar_url(self, key: impl Into<String>) -> Self {
        self.set("avatar_url", Value::String(key.into()))
    }

    pub fn username(self, username: Option<String>) -> Self {
        self.set("username", username.map_or(Value::Null, Value::String))
    }

    pub fn dob(self, dob: Option<String>) -> Self {
        self.set("dob", dob.map_or(Value::Null, Value::String))
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge this patch over `metadata`.
    pub fn apply_to(&self, metadata: &UserMetadata) -> Result<UserMetadata, serde_json::Error> {
        let mut merged = match serde_json::to_value(metadata)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &self.0 {
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged))
    }
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadedObject {
    /// Full storage path, bucket included: `avatars/<file name>`.
    pub path: String,
}

/// E-mail + password pair submitted by the sign-in form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

/// Why the session changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Notification delivered to session subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let metadata: UserMetadata = serde_json::from_value(json!({
            "avatar_url": "u1.png",
            "username": "ada",
            "theme": "dark",
        }))
        .unwrap();
        assert_eq!(metadata.avatar_url.as_deref(), Some("u1.png"));
        assert_eq!(metadata.dob, None);
        assert_eq!(metadata.extra.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_patch_overwrites_only_its_keys() {
        let metadata = UserMetadata {
            avatar_url: Some("old.png".to_string()),
            username: Some("ada".to_string()),
            dob: Some("1815-12-10".to_string()),
            extra: Map::new(),
        };
        let patch = MetadataPatch::new().username(Some("lovelace".to_string())).dob(None);
        let merged = patch.apply_to(&metadata).unwrap();

        assert_eq!(merged.avatar_url.as_deref(), Some("old.png"));
        assert_eq!(merged.username.as_deref(), Some("lovelace"));
        assert_eq!(merged.dob, None);
    }

    #[test]
    fn test_patch_serializes_as_plain_object() {
        let patch = MetadataPatch::new().avatar_url("u1.png");
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "avatar_url": "u1.png" }));
        assert_eq!(patch.keys().collect::<Vec<_>>(), vec!["avatar_url"]);
    }

    #[test]
    fn test_session_expiry() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: "bearer".to_string(),
            expires_at: 1_000,
            user: AuthUser {
                id: "u1".to_string(),
                email: None,
                user_metadata: UserMetadata::default(),
            },
        };
        assert!(!session.is_expired(999));
        assert!(session.is_expired(1_000));
        assert!(session.expires_within(950, 60));
        assert!(!session.expires_within(900, 60));
    }
}
