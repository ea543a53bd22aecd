//! # HTTP backend: GoTrue-style auth and object storage over REST
//!
//! [`HttpBackend`] talks to a hosted platform that exposes the usual
//! `auth/v1` and `storage/v1` REST surfaces. It is compiled for both the browser
//! (reqwest's fetch backend) and native targets.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | password sign-in | `POST auth/v1/token?grant_type=password` |
//! | sign-up | `POST auth/v1/signup` |
//! | magic link | `POST auth/v1/otp` |
//! | refresh | `POST auth/v1/token?grant_type=refresh_token` |
//! | sign-out | `POST auth/v1/logout` |
//! | current user | `GET auth/v1/user` |
//! | metadata update | `PUT auth/v1/user` with `{"data": patch}` |
//! | upload | `POST storage/v1/object/<bucket>/<key>` |
//! | public URL | `storage/v1/object/public/<bucket>/<key>` |
//!
//! Every request carries the project's anon key in the `apikey` header. Requests
//! made on behalf of the user send the session's access token as a bearer token;
//! the rest send the anon key there too.
//!
//! The session only lives in memory. After a page reload the user signs in again,
//! or lands back from a magic link, which [`HttpBackend::restore_from_redirect`]
//! turns into a session.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{
    AuthEvent, AuthUser, Credentials, MetadataPatch, Session, UploadedObject,
};
use crate::session::{current_timestamp, RedirectTokens, SessionState, SessionWatcher};

/// Token grant response from `auth/v1/token` and `auth/v1/signup`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now + self.expires_in.unwrap_or(3600));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: self.user,
        }
    }
}

/// Storage upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key", default)]
    key: Option<String>,
}

/// [`Backend`] backed by the hosted platform.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
    sessions: SessionState,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        config.validate()?;
        Ok(Self {
            config,
            client: reqwest::Client::new(),
            sessions: SessionState::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        self.client
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    fn require_session(&self) -> Result<Session, BackendError> {
        self.sessions.current().ok_or(BackendError::NotAuthenticated)
    }

    /// Finish a magic-link sign-in from the redirect URL fragment.
    ///
    /// Returns `Ok(None)` when the fragment carries no tokens.
    pub async fn restore_from_redirect(&self, fragment: &str) -> Result<Option<Session>, BackendError> {
        let Some(tokens) = RedirectTokens::from_fragment(fragment) else {
            return Ok(None);
        };

        let user: AuthUser = send(self.request(
            Method::GET,
            "auth/v1/user",
            Some(&tokens.access_token),
        ))
        .await?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at: current_timestamp() + tokens.expires_in,
            user,
        };
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(Some(session))
    }
}

/// Send `request` and decode a JSON success body.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::from_response(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Send `request`, ignoring any success body.
async fn send_empty(request: RequestBuilder) -> Result<(), BackendError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_response(status.as_u16(), &body));
    }
    Ok(())
}

impl Backend for HttpBackend {
    fn current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    fn subscribe(&self) -> SessionWatcher {
        self.sessions.subscribe()
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        let tokens: TokenResponse = send(
            self.request(Method::POST, "auth/v1/token", None)
                .query(&[("grant_type", "password")])
                .json(credentials),
        )
        .await?;

        let session = tokens.into_session(current_timestamp());
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, BackendError> {
        let body: Value = send(
            self.request(Method::POST, "auth/v1/signup", None)
                .json(credentials),
        )
        .await?;

        // Projects with e-mail confirmation enabled answer with the bare user.
        if body.get("access_token").is_none() {
            return Ok(None);
        }

        let tokens: TokenResponse = serde_json::from_value(body)?;
        let session = tokens.into_session(current_timestamp());
        self.sessions.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(Some(session))
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), BackendError> {
        let mut request = self
            .request(Method::POST, "auth/v1/otp", None)
            .json(&json!({ "email": email.trim(), "create_user": true }));
        if let Some(redirect_to) = &self.config.redirect_to {
            request = request.query(&[("redirect_to", redirect_to.as_str())]);
        }
        send_empty(request).await
    }

    async fn refresh_session(&self) -> Result<Session, BackendError> {
        let current = self.require_session()?;
        let tokens: TokenResponse = send(
            self.request(Method::POST, "auth/v1/token", None)
                .query(&[("grant_type", "refresh_token")])
                .json(&json!({ "refresh_token": current.refresh_token })),
        )
        .await
        .inspect_err(|_| {
            self.sessions.clear_expired(current_timestamp());
        })?;

        let session = tokens.into_session(current_timestamp());
        self.sessions.publish(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let current = self.sessions.current();
        self.sessions.publish(AuthEvent::SignedOut, None);

        let Some(session) = current else {
            return Ok(());
        };
        send_empty(self.request(Method::POST, "auth/v1/logout", Some(&session.access_token))).await
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        let Some(session) = self.sessions.current() else {
            return Ok(None);
        };
        let user: AuthUser = send(self.request(
            Method::GET,
            "auth/v1/user",
            Some(&session.access_token),
        ))
        .await?;
        Ok(Some(user))
    }

    async fn update_user_metadata(&self, patch: &MetadataPatch) -> Result<AuthUser, BackendError> {
        let mut session = self.require_session()?;
        let user: AuthUser = send(
            self.request(Method::PUT, "auth/v1/user", Some(&session.access_token))
                .json(&json!({ "data": patch })),
        )
        .await?;

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
        let session = self.require_session()?;
        let response: UploadResponse = send(
            self.request(
                Method::POST,
                &format!("storage/v1/object/{path}"),
                Some(&session.access_token),
            )
            .header(
                "Content-Type",
                content_type.unwrap_or("application/octet-stream"),
            )
            .header("x-upsert", "false")
            .body(body),
        )
        .await?;

        Ok(UploadedObject {
            path: response.key.unwrap_or_else(|| path.to_string()),
        })
    }

    fn object_url(&self, path: &str) -> String {
        self.endpoint(&format!("storage/v1/object/public/{path}"))
    }
}
