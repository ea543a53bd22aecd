//! In-process backend for tests and the offline demo mode.
//!
//! Accounts live in a map keyed by e-mail, uploads in a map keyed by path. Every
//! trait call is appended to a journal ([`MemoryBackend::calls`]) and any
//! operation can be made to fail on demand ([`MemoryBackend::fail`]) so UI wiring
//! can be checked without a network.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::Backend;
use crate::error::BackendError;
use crate::models::{
    AuthEvent, AuthUser, Credentials, MetadataPatch, Session, UploadedObject, UserMetadata,
};
use crate::session::{current_timestamp, SessionState, SessionWatcher};

const SESSION_LIFETIME_SECS: i64 = 3600;

/// A recorded trait call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    SignIn { email: String },
    SignUp { email: String },
    MagicLink { email: String },
    RefreshSession,
    SignOut,
    CurrentUser,
    UpdateUserMetadata(MetadataPatch),
    UploadObject {
        path: String,
        len: usize,
        content_type: Option<String>,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::SignIn { .. } => Operation::SignIn,
            Call::SignUp { .. } => Operation::SignUp,
            Call::MagicLink { .. } => Operation::MagicLink,
            Call::RefreshSession => Operation::RefreshSession,
            Call::SignOut => Operation::SignOut,
            Call::CurrentUser => Operation::CurrentUser,
            Call::UpdateUserMetadata(_) => Operation::UpdateUserMetadata,
            Call::UploadObject { .. } => Operation::UploadObject,
        }
    }
}

/// Operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    MagicLink,
    RefreshSession,
    SignOut,
    CurrentUser,
    UpdateUserMetadata,
    UploadObject,
}

#[derive(Debug)]
struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Debug)]
struct StoredObject {
    body: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    objects: HashMap<String, StoredObject>,
    magic_links: Vec<String>,
    calls: Vec<Call>,
    failing: HashSet<Operation>,
}

impl MemoryState {
    fn account_by_id(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.values_mut().find(|a| a.user.id == id)
    }

    fn create_account(&mut self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: UserMetadata::default(),
        };
        self.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }
}

/// In-memory [`Backend`].
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    sessions: SessionState,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryBackend::add_account`].
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.add_account(email, password);
        self
    }

    pub fn add_account(&self, email: &str, password: &str) -> AuthUser {
        self.lock().create_account(email, password)
    }

    /// Start a session for an existing account without going through sign-in.
    pub fn sign_in_as(&self, email: &str) -> Option<Session> {
        let user = self.lock().accounts.get(email)?.user.clone();
        let session = issue_session(user);
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Some(session)
    }

    /// Move the session's expiry into the past, as if the tab had slept through it.
    ///
    /// The session stays in place until something notices it is dead.
    pub fn expire_session(&self) {
        if let Some(mut session) = self.sessions.current() {
            session.expires_at = current_timestamp() - 1;
            self.sessions.publish(AuthEvent::TokenRefreshed, Some(session));
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind.
    pub fn calls_to(&self, operation: Operation) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every following call of `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.lock().failing.remove(&operation);
    }

    pub fn user(&self, email: &str) -> Option<AuthUser> {
        self.lock().accounts.get(email).map(|a| a.user.clone())
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(path).map(|o| o.body.clone())
    }

    pub fn object_content_type(&self, path: &str) -> Option<String> {
        self.lock()
            .objects
            .get(path)
            .and_then(|o| o.content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// E-mail addresses a magic link was sent to, oldest first.
    pub fn magic_links_sent(&self) -> Vec<String> {
        self.lock().magic_links.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Journal `call` and report an injected failure, if any.
    fn record(&self, call: Call) -> Result<(), BackendError> {
        let operation = call.operation();
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&operation) {
            return Err(BackendError::api(
                503,
                format!("{operation:?} is unavailable"),
            ));
        }
        Ok(())
    }

    fn require_session(&self) -> Result<Session, BackendError> {
        self.sessions.current().ok_or(BackendError::NotAuthenticated)
    }
}

fn issue_session(user: AuthUser) -> Session {
    Session {
        access_token: format!("memory-access-{}", uuid::Uuid::new_v4()),
        refresh_token: format!("memory-refresh-{}", uuid::Uuid::new_v4()),
        token_type: "bearer".to_string(),
        expires_at: current_timestamp() + SESSION_LIFETIME_SECS,
        user,
    }
}

impl Backend for MemoryBackend {
    fn current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    fn subscribe(&self) -> SessionWatcher {
        self.sessions.subscribe()
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        self.record(Call::SignIn {
            email: credentials.email.clone(),
        })?;

        let user = {
            let state = self.lock();
            match state.accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.user.clone(),
                _ => return Err(BackendError::api(400, "Invalid login credentials")),
            }
        };

        let session = issue_session(user);
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, BackendError> {
        self.record(Call::SignUp {
            email: credentials.email.clone(),
        })?;

        if !credentials.email.contains('@') {
            return Err(BackendError::api(422, "Unable to validate email address: invalid format"));
        }
        if credentials.password.len() < 6 {
            return Err(BackendError::api(422, "Password should be at least 6 characters"));
        }

        let user = {
            let mut state = self.lock();
            if state.accounts.contains_key(&credentials.email) {
                return Err(BackendError::api(422, "User already registered"));
            }
            state.create_account(&credentials.email, &credentials.password)
        };

        let session = issue_session(user);
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(Some(session))
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), BackendError> {
        self.record(Call::MagicLink {
            email: email.to_string(),
        })?;

        let mut state = self.lock();
        if !state.accounts.contains_key(email) {
            state.create_account(email, "");
        }
        state.magic_links.push(email.to_string());
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, BackendError> {
        let current = self.require_session()?;
        self.record(Call::RefreshSession).inspect_err(|_| {
            self.sessions.clear_expired(current_timestamp());
        })?;

        let session = issue_session(current.user);
        self.sessions.publish(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let outcome = self.record(Call::SignOut);
        self.sessions.publish(AuthEvent::SignedOut, None);
        outcome
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        self.record(Call::CurrentUser)?;
        let Some(session) = self.sessions.current() else {
            return Ok(None);
        };

        let mut state = self.lock();
        Ok(state.account_by_id(&session.user.id).map(|a| a.user.clone()))
    }

    async fn update_user_metadata(&self, patch: &MetadataPatch) -> Result<AuthUser, BackendError> {
        self.record(Call::UpdateUserMetadata(patch.clone()))?;
        let mut session = self.require_session()?;

        let user = {
            let mut state = self.lock();
            let account = state
                .account_by_id(&session.user.id)
                .ok_or_else(|| BackendError::api(404, "User not found"))?;
            account.user.user_metadata = patch.apply_to(&account.user.user_metadata)?;
            account.user.clone()
        };

        session.user = user.clone();
        self.sessions.publish(AuthEvent::UserUpdated, Some(session));
        Ok(user)
    }

    async fn upload_object(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadedObject, BackendError> {
        self.record(Call::UploadObject {
            path: path.to_string(),
            len: body.len(),
            content_type: content_type.map(str::to_string),
        })?;
        self.require_session()?;

        let mut state = self.lock();
        if state.objects.contains_key(path) {
            return Err(BackendError::api(409, "The resource already exists"));
        }
        state.objects.insert(
            path.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(UploadedObject {
            path: path.to_string(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL: &str = "ada@example.com";

    #[tokio::test]
    async fn test_sign_in_publishes_session() {
        let backend = MemoryBackend::new().with_account(EMAIL, "secret-pw");
        let mut watcher = backend.subscribe();
        assert!(backend.current_session().is_none());

        let session = backend
            .sign_in_with_password(&Credentials::new(EMAIL, "secret-pw"))
            .await
            .unwrap();
        assert_eq!(session.user.email.as_deref(), Some(EMAIL));

        let change = watcher.changed().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);
        assert_eq!(change.session, Some(session));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let backend = MemoryBackend::new().with_account(EMAIL, "secret-pw");
        let err = backend
            .sign_in_with_password(&Credentials::new(EMAIL, "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates_and_short_passwords() {
        let backend = MemoryBackend::new();
        let creds = Credentials::new(EMAIL, "long-enough");
        assert!(backend.sign_up(&creds).await.unwrap().is_some());
        assert!(backend.sign_up(&creds).await.is_err());
        assert!(backend
            .sign_up(&Credentials::new("bob@example.com", "123"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_current_user_without_session() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        assert!(backend.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_metadata_merges_and_notifies() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        backend.sign_in_as(EMAIL).unwrap();
        let mut watcher = backend.subscribe();

        backend
            .update_user_metadata(&MetadataPatch::new().avatar_url("a.png"))
            .await
            .unwrap();
        let user = backend
            .update_user_metadata(&MetadataPatch::new().username(Some("ada".to_string())))
            .await
            .unwrap();

        assert_eq!(user.user_metadata.avatar_url.as_deref(), Some("a.png"));
        assert_eq!(user.user_metadata.username.as_deref(), Some("ada"));

        let change = watcher.changed().await.unwrap();
        assert_eq!(change.event, AuthEvent::UserUpdated);
        assert_eq!(
            change.session.unwrap().user.user_metadata.username.as_deref(),
            Some("ada")
        );

        let fetched = backend.current_user().await.unwrap().unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_upload_requires_session_and_refuses_overwrite() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        assert!(matches!(
            backend.upload_object("avatars/a.png", vec![1], None).await,
            Err(BackendError::NotAuthenticated)
        ));

        backend.sign_in_as(EMAIL).unwrap();
        let stored = backend
            .upload_object("avatars/a.png", vec![1, 2, 3], Some("image/png"))
            .await
            .unwrap();
        assert_eq!(stored.path, "avatars/a.png");
        assert_eq!(backend.object("avatars/a.png"), Some(vec![1, 2, 3]));
        assert_eq!(
            backend.object_content_type("avatars/a.png").as_deref(),
            Some("image/png")
        );

        let err = backend
            .upload_object("avatars/a.png", vec![4], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(backend.object_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_when_failing() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        backend.sign_in_as(EMAIL).unwrap();
        backend.fail(Operation::SignOut);

        assert!(backend.sign_out().await.is_err());
        assert!(backend.current_session().is_none());
        assert_eq!(backend.calls(), vec![Call::SignOut]);
    }

    #[tokio::test]
    async fn test_failure_injection_and_recovery() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        backend.sign_in_as(EMAIL).unwrap();

        backend.fail(Operation::CurrentUser);
        assert_eq!(backend.current_user().await.unwrap_err().status(), Some(503));

        backend.recover(Operation::CurrentUser);
        assert!(backend.current_user().await.unwrap().is_some());
        assert_eq!(backend.calls_to(Operation::CurrentUser).len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_issues_new_tokens() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        assert!(backend.refresh_session().await.is_err());

        let first = backend.sign_in_as(EMAIL).unwrap();
        let refreshed = backend.refresh_session().await.unwrap();
        assert_ne!(first.access_token, refreshed.access_token);
        assert_eq!(first.user, refreshed.user);
        assert_eq!(backend.current_session(), Some(refreshed));
    }

    #[tokio::test]
    async fn test_failed_refresh_drops_expired_session_only() {
        let backend = MemoryBackend::new().with_account(EMAIL, "pw");
        backend.sign_in_as(EMAIL).unwrap();
        backend.fail(Operation::RefreshSession);

        assert!(backend.refresh_session().await.is_err());
        assert!(backend.current_session().is_some());

        backend.expire_session();
        assert!(backend.current_session().unwrap().is_expired(current_timestamp()));
        let mut watcher = backend.subscribe();
        assert!(backend.refresh_session().await.is_err());
        assert!(backend.current_session().is_none());
        assert_eq!(watcher.changed().await.unwrap().event, AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_magic_link_creates_account() {
        let backend = MemoryBackend::new();
        backend.send_magic_link("new@example.com").await.unwrap();
        assert_eq!(backend.magic_links_sent(), vec!["new@example.com".to_string()]);
        assert!(backend.user("new@example.com").is_some());
        assert!(backend.current_session().is_none());
    }
}
