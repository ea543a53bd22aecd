//! # Session broadcast
//!
//! [`SessionState`] holds the latest [`SessionChange`] in a `tokio::sync::watch`
//! channel. Both backends own one and publish into it on sign-in, sign-out, token
//! refresh and user update. Subscribers hold a [`SessionWatcher`]; because `watch`
//! only keeps the newest value a slow subscriber skips intermediate states instead
//! of lagging behind.
//!
//! This module also parses the token fragment a magic-link redirect lands with
//! ([`RedirectTokens::from_fragment`]) and provides a platform-aware clock
//! ([`current_timestamp`]).

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{AuthEvent, Session, SessionChange};

/// Shared, cloneable owner of the current session.
#[derive(Clone, Debug)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionChange>>,
}

impl Default for SessionState {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(SessionChange {
            event: AuthEvent::InitialSession,
            session: None,
        });
        Self { tx: Arc::new(tx) }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session.clone()
    }

    /// Replace the session and notify every subscriber.
    pub fn publish(&self, event: AuthEvent, session: Option<Session>) {
        tracing::debug!(
            ?event,
            user = session.as_ref().map(|s| s.user.id.as_str()),
            "session changed"
        );
        self.tx.send_replace(SessionChange { event, session });
    }

    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Drop the session if its access token has expired at `now`.
    ///
    /// Publishes `SignedOut` and returns `true` when a session was dropped.
    pub fn clear_expired(&self, now: i64) -> bool {
        let expired = self
            .tx
            .borrow()
            .session
            .as_ref()
            .is_some_and(|s| s.is_expired(now));
        if expired {
            tracing::info!("access token expired, dropping session");
            self.publish(AuthEvent::SignedOut, None);
        }
        expired
    }
}

/// Receives session changes published after it was created.
#[derive(Debug)]
pub struct SessionWatcher {
    rx: watch::Receiver<SessionChange>,
}

impl SessionWatcher {
    /// Wait for the next change. Returns `None` once the backend is gone.
    pub async fn changed(&mut self) -> Option<SessionChange> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Tokens carried in the URL fragment after following a magic link.
#[derive(Clone, Debug, PartialEq)]
pub struct RedirectTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl RedirectTokens {
    /// Parse `access_token=…&refresh_token=…&expires_in=…&token_type=…`.
    ///
    /// A leading `#` is accepted. Returns `None` unless both tokens are present.
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let mut access_token = None;
        let mut refresh_token = None;
        let mut token_type = None;
        let mut expires_in = None;

        for pair in fragment.trim_start_matches('#').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "access_token" => access_token = Some(value.to_string()),
                "refresh_token" => refresh_token = Some(value.to_string()),
                "token_type" => token_type = Some(value.to_string()),
                "expires_in" => expires_in = value.parse().ok(),
                _ => {}
            }
        }

        Some(Self {
            access_token: access_token.filter(|t| !t.is_empty())?,
            refresh_token: refresh_token.filter(|t| !t.is_empty())?,
            token_type: token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in: expires_in.unwrap_or(3600),
        })
    }
}

/// Seconds since the Unix epoch.
pub fn current_timestamp() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
