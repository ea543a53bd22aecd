//! # Profile page wiring
//!
//! Everything the profile page does with the backend, kept free of Dioxus so it
//! can be driven directly against [`backend::MemoryBackend`] in tests. Components
//! call these functions and only deal with signals and rendering.
//!
//! | Function | Backend calls |
//! |----------|---------------|
//! | [`fetch_profile`] / [`refresh_for`] | `current_user` (none without a session) |
//! | [`follow_session`] | [`refresh_for`] now and after every session change |
//! | [`upload_avatar`] | `upload_object`, then `update_user_metadata` with `avatar_url` |
//! | [`update_profile`] | `update_user_metadata` with `username` and `dob` |
//! | [`sign_out`] | `sign_out` |
//!
//! Failures are logged here with `tracing` and handed back so the caller can
//! decide how loudly to surface them.

use std::ops::ControlFlow;

use backend::storage::split_object_path;
use backend::{
    avatar_file_name, file_extension, object_path, Backend, BackendError, MetadataPatch, Session,
    UserMetadata,
};
use thiserror::Error;

/// Which form the page shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Profile,
}

impl Screen {
    pub fn for_session(session: Option<&Session>) -> Self {
        match session {
            Some(_) => Screen::Profile,
            None => Screen::SignIn,
        }
    }
}

/// Local, editable copy of the profile metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileFields {
    /// Avatar key inside the avatars bucket.
    pub avatar: Option<String>,
    pub username: Option<String>,
    pub dob: Option<String>,
}

impl ProfileFields {
    pub fn from_metadata(metadata: &UserMetadata) -> Self {
        Self {
            avatar: metadata.avatar_url.clone(),
            username: metadata.username.clone(),
            dob: metadata.dob.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The fields the "Update profile" button writes back.
    pub fn to_patch(&self) -> MetadataPatch {
        MetadataPatch::new()
            .username(self.username.clone())
            .dob(self.dob.clone())
    }
}

/// A file picked in the upload button.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    /// Base name of the file, without any directory.
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// `name` may be a full path (desktop file pickers hand those out).
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        let name = name.rsplit(['/', '\\']).next().unwrap_or(name).to_string();
        Self {
            content_type: image_content_type(&name).map(str::to_string),
            name,
            bytes,
        }
    }
}

/// MIME type for common image extensions.
pub fn image_content_type(name: &str) -> Option<&'static str> {
    match file_extension(name).to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("You must select an image to upload")]
    NoFile,
    #[error("You must be signed in to upload an avatar")]
    NotSignedIn,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Profile fields of the signed-in user; empty when nobody is signed in.
pub async fn fetch_profile<B: Backend>(backend: &B) -> Result<ProfileFields, BackendError> {
    match backend.current_user().await {
        Ok(user) => Ok(user
            .map(|u| ProfileFields::from_metadata(&u.user_metadata))
            .unwrap_or_default()),
        Err(e) => {
            tracing::error!("Failed to load profile: {e}");
            Err(e)
        }
    }
}

/// Fields to show after the session became `session`.
///
/// A session re-fetches the profile; no session clears it without calling out.
pub async fn refresh_for<B: Backend>(
    backend: &B,
    session: Option<&Session>,
) -> Result<ProfileFields, BackendError> {
    match session {
        Some(_) => fetch_profile(backend).await,
        None => Ok(ProfileFields::default()),
    }
}

/// Load the fields for the current session, then again after every change.
///
/// `on_fields` sees each load result and may stop the loop with
/// [`ControlFlow::Break`]; it also ends if the session channel closes.
pub async fn follow_session<B, F>(backend: &B, mut on_fields: F)
where
    B: Backend,
    F: FnMut(Result<ProfileFields, BackendError>) -> ControlFlow<()>,
{
    let mut watcher = backend.subscribe();
    let mut session = backend.current_session();
    loop {
        if on_fields(refresh_for(backend, session.as_ref()).await).is_break() {
            return;
        }
        match watcher.changed().await {
            Some(change) => session = change.session,
            None => return,
        }
    }
}

/// Upload `file` as the new avatar and point the profile at it.
///
/// Returns the avatar key stored in metadata. The metadata update only happens
/// once the upload succeeded.
pub async fn upload_avatar<B: Backend>(
    backend: &B,
    bucket: &str,
    file: Option<SelectedFile>,
) -> Result<String, UploadError> {
    let file = file.ok_or(UploadError::NoFile)?;
    let session = backend.current_session().ok_or(UploadError::NotSignedIn)?;

    let file_name = avatar_file_name(&session.user.id, &file.name);
    let path = object_path(bucket, &file_name);

    let stored = backend
        .upload_object(&path, file.bytes, file.content_type.as_deref())
        .await
        .inspect_err(|e| tracing::error!("Failed to upload {path}: {e}"))?;

    let avatar = split_object_path(&stored.path)
        .map(|(_, key)| key.to_string())
        .unwrap_or(file_name);

    backend
        .update_user_metadata(&MetadataPatch::new().avatar_url(avatar.clone()))
        .await
        .inspect_err(|e| tracing::error!("Failed to save avatar reference: {e}"))?;

    Ok(avatar)
}

/// Write the form's username and date of birth back to the user record.
pub async fn update_profile<B: Backend>(
    backend: &B,
    fields: &ProfileFields,
) -> Result<(), BackendError> {
    backend
        .update_user_metadata(&fields.to_patch())
        .await
        .map(|_| ())
        .inspect_err(|e| tracing::error!("Failed to update profile: {e}"))
}

pub async fn sign_out<B: Backend>(backend: &B) -> Result<(), BackendError> {
    backend
        .sign_out()
        .await
        .inspect_err(|e| tracing::error!("Error logging out: {e}"))
}

/// Public URL of the avatar, if there is one.
pub fn avatar_url<B: Backend>(backend: &B, bucket: &str, avatar: Option<&str>) -> Option<String> {
    avatar
        .filter(|key| !key.is_empty())
        .map(|key| backend.object_url(&object_path(bucket, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{Call, MemoryBackend, Operation, DEFAULT_AVATARS_BUCKET};
    use serde_json::json;

    const EMAIL: &str = "ada@example.com";

    fn signed_in() -> (MemoryBackend, Session) {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        let session = backend.sign_in_as(EMAIL).unwrap();
        (backend, session)
    }

    fn png() -> Option<SelectedFile> {
        Some(SelectedFile::new("me.png", vec![0x89, b'P', b'N', b'G']))
    }

    #[test]
    fn test_screen_follows_session() {
        let (_, session) = signed_in();
        assert_eq!(Screen::for_session(None), Screen::SignIn);
        assert_eq!(Screen::for_session(Some(&session)), Screen::Profile);
    }

    #[tokio::test]
    async fn test_fetch_profile_reads_metadata() {
        let (backend, _) = signed_in();
        backend
            .update_user_metadata(
                &MetadataPatch::new()
                    .avatar_url("a.png")
                    .username(Some("ada".to_string()))
                    .dob(Some("1815-12-10".to_string())),
            )
            .await
            .unwrap();

        let fields = fetch_profile(&backend).await.unwrap();
        assert_eq!(
            fields,
            ProfileFields {
                avatar: Some("a.png".to_string()),
                username: Some("ada".to_string()),
                dob: Some("1815-12-10".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_returned() {
        let (backend, _) = signed_in();
        backend.fail(Operation::CurrentUser);
        assert!(fetch_profile(&backend).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_calls_storage_once_with_conventional_path() {
        let (backend, session) = signed_in();

        let avatar = upload_avatar(&backend, DEFAULT_AVATARS_BUCKET, png())
            .await
            .unwrap();

        let uploads = backend.calls_to(Operation::UploadObject);
        assert_eq!(uploads.len(), 1);
        let Call::UploadObject { path, len, content_type } = &uploads[0] else {
            unreachable!()
        };
        assert_eq!(path, &format!("avatars/{avatar}"));
        assert!(avatar.starts_with(&session.user.id));
        assert!(avatar.ends_with(".png"));
        let suffix = &avatar[session.user.id.len()..avatar.len() - ".png".len()];
        assert!(suffix.parse::<f64>().is_ok());
        assert_eq!(*len, 4);
        assert_eq!(content_type.as_deref(), Some("image/png"));

        assert_eq!(
            backend.calls_to(Operation::UpdateUserMetadata),
            vec![Call::UpdateUserMetadata(MetadataPatch::new().avatar_url(avatar.clone()))]
        );
        let fields = fetch_profile(&backend).await.unwrap();
        assert_eq!(fields.avatar, Some(avatar));
    }

    #[tokio::test]
    async fn test_upload_failure_skips_metadata_update() {
        let (backend, _) = signed_in();
        backend.fail(Operation::UploadObject);

        let err = upload_avatar(&backend, DEFAULT_AVATARS_BUCKET, png())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Backend(_)));
        assert!(!err.to_string().is_empty());
        assert!(backend.calls_to(Operation::UpdateUserMetadata).is_empty());
        assert_eq!(backend.object_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_file_makes_no_calls() {
        let (backend, _) = signed_in();
        backend.clear_calls();

        let err = upload_avatar(&backend, DEFAULT_AVATARS_BUCKET, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You must select an image to upload");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let backend = MemoryBackend::new();
        let err = upload_avatar(&backend, DEFAULT_AVATARS_BUCKET, png())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotSignedIn));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_exactly_form_fields() {
        let (backend, _) = signed_in();
        let fields = ProfileFields {
            avatar: Some("ignored.png".to_string()),
            username: Some("lovelace".to_string()),
            dob: Some("1815-12-10".to_string()),
        };

        update_profile(&backend, &fields).await.unwrap();

        let updates = backend.calls_to(Operation::UpdateUserMetadata);
        assert_eq!(updates.len(), 1);
        let Call::UpdateUserMetadata(patch) = &updates[0] else {
            unreachable!()
        };
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            json!({ "username": "lovelace", "dob": "1815-12-10" })
        );
    }

    #[tokio::test]
    async fn test_update_failure_is_returned() {
        let (backend, _) = signed_in();
        backend.fail(Operation::UpdateUserMetadata);
        assert!(update_profile(&backend, &ProfileFields::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_then_null_session_clears_fields() {
        let (backend, session) = signed_in();
        backend
            .update_user_metadata(&MetadataPatch::new().username(Some("ada".to_string())))
            .await
            .unwrap();
        let fields = refresh_for(&backend, Some(&session)).await.unwrap();
        assert_eq!(fields.username.as_deref(), Some("ada"));

        let mut watcher = backend.subscribe();
        sign_out(&backend).await.unwrap();
        assert_eq!(backend.calls_to(Operation::SignOut).len(), 1);

        let change = watcher.changed().await.unwrap();
        assert!(change.session.is_none());
        backend.clear_calls();
        let fields = refresh_for(&backend, change.session.as_ref()).await.unwrap();
        assert_eq!(fields, ProfileFields::default());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_followed_fields_clear_after_sign_out() {
        let (backend, _) = signed_in();
        backend
            .update_user_metadata(
                &MetadataPatch::new()
                    .avatar_url("a.png")
                    .username(Some("ada".to_string()))
                    .dob(Some("1815-12-10".to_string())),
            )
            .await
            .unwrap();

        let mut seen = Vec::new();
        let follow = follow_session(&backend, |loaded| {
            seen.push(loaded.unwrap());
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let (_, signed_out) = tokio::join!(follow, sign_out(&backend));
        signed_out.unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].avatar.as_deref(), Some("a.png"));
        assert_eq!(seen[0].username.as_deref(), Some("ada"));
        assert_eq!(seen[0].dob.as_deref(), Some("1815-12-10"));
        assert_eq!(seen[1], ProfileFields::default());
    }

    #[tokio::test]
    async fn test_followed_fields_reload_on_sign_in() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        let mut seen = Vec::new();
        let follow = follow_session(&backend, |loaded| {
            seen.push(loaded.is_ok());
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let sign_in = async {
            backend.sign_in_as(EMAIL).unwrap();
        };
        tokio::join!(follow, sign_in);

        assert_eq!(seen, vec![true, true]);
        assert_eq!(backend.calls_to(Operation::CurrentUser).len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_failure_still_ends_session() {
        let (backend, _) = signed_in();
        backend.fail(Operation::SignOut);
        assert!(sign_out(&backend).await.is_err());
        assert!(backend.current_session().is_none());
    }

    #[test]
    fn test_selected_file_strips_directories() {
        let file = SelectedFile::new("/home/ada/Pictures/me.JPG", vec![]);
        assert_eq!(file.name, "me.JPG");
        assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));

        let file = SelectedFile::new("C:\\Users\\ada\\notes.txt", vec![]);
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.content_type, None);
    }

    #[test]
    fn test_avatar_url() {
        let backend = MemoryBackend::new();
        assert_eq!(
            avatar_url(&backend, "avatars", Some("u1.png")).as_deref(),
            Some("memory://avatars/u1.png")
        );
        assert_eq!(avatar_url(&backend, "avatars", Some("")), None);
        assert_eq!(avatar_url(&backend, "avatars", None), None);
    }

    #[test]
    fn test_clear_fields() {
        let mut fields = ProfileFields {
            avatar: Some("a".to_string()),
            username: Some("b".to_string()),
            dob: None,
        };
        fields.clear();
        assert_eq!(fields, ProfileFields::default());
    }
}
