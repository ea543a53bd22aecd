//! # The `Backend` trait
//!
//! The app treats its backend-as-a-service as an opaque collaborator with three
//! capabilities: session lifecycle, user-metadata read/update, and binary object
//! upload. This trait is that boundary. Implementations:
//!
//! - [`crate::HttpBackend`]: the real platform over REST.
//! - [`crate::MemoryBackend`]: an in-process fake with a call journal.
//! - [`crate::AnyBackend`]: picks one of the above at startup.
//!
//! Futures are not required to be `Send`: the UI runs on a single-threaded
//! executor (browser event loop or the desktop webview thread).
//!
//! ## Session notifications
//!
//! Every implementation publishes a [`crate::SessionChange`] through its
//! [`crate::SessionState`] when the session changes:
//!
//! | Call | Event |
//! |------|-------|
//! | [`sign_in_with_password`](Backend::sign_in_with_password), [`sign_up`](Backend::sign_up) with a session | `SignedIn` |
//! | [`sign_out`](Backend::sign_out) | `SignedOut` (always, even when the remote call fails) |
//! | [`refresh_session`](Backend::refresh_session) | `TokenRefreshed` |
//! | [`update_user_metadata`](Backend::update_user_metadata) | `UserUpdated` |

use std::future::Future;

use crate::error::BackendError;
use crate::models::{AuthUser, Credentials, MetadataPatch, Session, UploadedObject};
use crate::session::SessionWatcher;

pub trait Backend {
    /// Session currently held by the client, if any.
    fn current_session(&self) -> Option<Session>;

    /// Subscribe to session changes published from now on.
    fn subscribe(&self) -> SessionWatcher;

    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, BackendError>>;

    /// Create an account. `None` means the platform wants the e-mail confirmed
    /// before it hands out a session.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Option<Session>, BackendError>>;

    /// Ask the platform to e-mail a password-less sign-in link.
    fn send_magic_link(&self, email: &str) -> impl Future<Output = Result<(), BackendError>>;

    /// Trade the refresh token for a new access token.
    fn refresh_session(&self) -> impl Future<Output = Result<Session, BackendError>>;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>>;

    /// The signed-in user with fresh metadata, or `None` without a session.
    fn current_user(&self) -> impl Future<Output = Result<Option<AuthUser>, BackendError>>;

    fn update_user_metadata(
        &self,
        patch: &MetadataPatch,
    ) -> impl Future<Output = Result<AuthUser, BackendError>>;

    /// Store `body` at `path` (`<bucket>/<key>`).
    fn upload_object(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> impl Future<Output = Result<UploadedObject, BackendError>>;

    /// URL an `<img>` can load the object at `path` from.
    fn object_url(&self, path: &str) -> String;
}
