//! Startup-time choice between the hosted platform and the in-memory fake.

use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::http::HttpBackend;
use crate::memory::MemoryBackend;
use crate::models::{AuthUser, Credentials, MetadataPatch, Session, UploadedObject};
use crate::session::SessionWatcher;

/// The backend the app actually runs against.
#[derive(Clone, Debug)]
pub enum AnyBackend {
    Http(HttpBackend),
    /// Offline demo mode: nothing leaves the process.
    Memory(MemoryBackend),
}

impl AnyBackend {
    /// Hosted platform when `config` names one, in-memory fake otherwise.
    pub fn from_config(config: BackendConfig) -> Result<Self, BackendError> {
        if config.is_configured() {
            Ok(Self::Http(HttpBackend::new(config)?))
        } else {
            tracing::warn!("no backend url configured, running in offline demo mode");
            Ok(Self::Memory(MemoryBackend::new()))
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Finish a magic-link sign-in; the in-memory backend never sends real links.
    pub async fn restore_from_redirect(&self, fragment: &str) -> Result<Option<Session>, BackendError> {
        match self {
            Self::Http(b) => b.restore_from_redirect(fragment).await,
            Self::Memory(_) => Ok(None),
        }
    }
}

impl Backend for AnyBackend {
    fn current_session(&self) -> Option<Session> {
        match self {
            Self::Http(b) => b.current_session(),
            Self::Memory(b) => b.current_session(),
        }
    }

    fn subscribe(&self) -> SessionWatcher {
        match self {
            Self::Http(b) => b.subscribe(),
            Self::Memory(b) => b.subscribe(),
        }
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        match self {
            Self::Http(b) => b.sign_in_with_password(credentials).await,
            Self::Memory(b) => b.sign_in_with_password(credentials).await,
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, BackendError> {
        match self {
            Self::Http(b) => b.sign_up(credentials).await,
            Self::Memory(b) => b.sign_up(credentials).await,
        }
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), BackendError> {
        match self {
            Self::Http(b) => b.send_magic_link(email).await,
            Self::Memory(b) => b.send_magic_link(email).await,
        }
    }

    async fn refresh_session(&self) -> Result<Session, BackendError> {
        match self {
            Self::Http(b) => b.refresh_session().await,
            Self::Memory(b) => b.refresh_session().await,
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        match self {
            Self::Http(b) => b.sign_out().await,
            Self::Memory(b) => b.sign_out().await,
        }
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        match self {
            Self::Http(b) => b.current_user().await,
            Self::Memory(b) => b.current_user().await,
        }
    }

    async fn update_user_metadata(&self, patch: &MetadataPatch) -> Result<AuthUser, BackendError> {
        match self {
            Self::Http(b) => b.update_user_metadata(patch).await,
            Self::Memory(b) => b.update_user_metadata(patch).await,
        }
    }

    async fn upload_object(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadedObject, BackendError> {
        match self {
            Self::Http(b) => b.upload_object(path, body, content_type).await,
            Self::Memory(b) => b.upload_object(path, body, content_type).await,
        }
    }

    fn object_url(&self, path: &str) -> String {
        match self {
            Self::Http(b) => b.object_url(path),
            Self::Memory(b) => b.object_url(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_runs_offline() {
        let backend = AnyBackend::from_config(BackendConfig::default()).unwrap();
        assert!(backend.is_offline());
    }

    #[test]
    fn test_configured_uses_http() {
        let backend =
            AnyBackend::from_config(BackendConfig::new("https://demo.example.co", "anon")).unwrap();
        assert!(!backend.is_offline());
        assert!(backend.object_url("avatars/a.png").starts_with("https://demo.example.co/"));
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(AnyBackend::from_config(BackendConfig::new("ftp://nope", "anon")).is_err());
    }
}
