//! Session context and hooks for the UI.

use std::time::Duration;

use backend::session::current_timestamp;
use backend::{AnyBackend, Backend, BackendConfig, BackendError, Session};
use dioxus::prelude::*;

/// How often the refresh loop looks at the session.
const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(30);
/// Refresh once the access token expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Backend handle plus the settings components need alongside it.
#[derive(Clone, Debug)]
pub struct Platform {
    pub backend: AnyBackend,
    pub avatars_bucket: String,
}

impl Platform {
    /// Build from `config`, falling back to offline mode when it is unusable.
    pub fn from_config(config: BackendConfig) -> Self {
        let avatars_bucket = config.avatars_bucket.clone();
        let backend = AnyBackend::from_config(config).unwrap_or_else(|e| {
            tracing::error!("Backend configuration rejected, running offline: {e}");
            AnyBackend::Memory(backend::MemoryBackend::new())
        });
        Self {
            backend,
            avatars_bucket,
        }
    }
}

/// Platform-appropriate configuration source.
///
/// - **Web**: values baked in at compile time.
/// - **Desktop**: `backend.toml` and `BACKEND_*` environment variables.
pub fn make_platform() -> Platform {
    #[cfg(target_arch = "wasm32")]
    let config = BackendConfig::from_build_env();

    #[cfg(not(target_arch = "wasm32"))]
    let config = BackendConfig::load().unwrap_or_else(|e| {
        tracing::error!("Failed to load backend configuration: {e}");
        BackendConfig::default()
    });

    Platform::from_config(config)
}

pub fn use_platform() -> Platform {
    use_context::<Platform>()
}

/// Session state as the page sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session: Option<Session>,
    /// True until any magic-link redirect has been handled.
    pub loading: bool,
    /// Running against the in-memory backend.
    pub offline: bool,
}

/// Get the current session state.
/// Returns a signal that updates whenever the backend publishes a session change.
pub fn use_session() -> Signal<SessionView> {
    use_context::<Signal<SessionView>>()
}

/// Whether `session` should be refreshed at `now`.
pub fn needs_refresh(session: &Session, now: i64) -> bool {
    session.expires_within(now, REFRESH_MARGIN_SECS)
}

/// One pass of the token refresh loop at `now`.
///
/// Returns the refreshed session, or `None` when nothing needed refreshing. A
/// failed refresh of an already expired session also signs the user out.
pub async fn refresh_if_needed<B: Backend>(
    backend: &B,
    now: i64,
) -> Result<Option<Session>, BackendError> {
    let Some(session) = backend.current_session() else {
        return Ok(None);
    };
    if !needs_refresh(&session, now) {
        return Ok(None);
    }
    match backend.refresh_session().await {
        Ok(refreshed) => Ok(Some(refreshed)),
        Err(e) => {
            if backend.current_session().is_none() {
                tracing::warn!("Session expired and could not be refreshed: {e}");
            } else {
                tracing::error!("Failed to refresh session: {e}");
            }
            Err(e)
        }
    }
}

/// Provider component that owns the backend and tracks the session.
/// Wrap your app with this component.
#[component]
pub fn SessionProvider(children: Element) -> Element {
    let platform = use_context_provider(make_platform);
    let mut state = use_signal(|| SessionView {
        session: platform.backend.current_session(),
        loading: true,
        offline: platform.backend.is_offline(),
    });
    use_context_provider(|| state);

    // Finish a magic-link sign-in, then stop showing the loading state
    let backend = platform.backend.clone();
    use_future(move || {
        let backend = backend.clone();
        async move {
            if let Some(fragment) = location_fragment() {
                match backend.restore_from_redirect(&fragment).await {
                    Ok(Some(_)) => clear_location_fragment(),
                    Ok(None) => {}
                    Err(e) => tracing::error!("Failed to complete sign-in from link: {e}"),
                }
            }
            let mut current = state();
            current.session = backend.current_session();
            current.loading = false;
            state.set(current);
        }
    });

    // Follow session changes
    let backend = platform.backend.clone();
    use_future(move || {
        let backend = backend.clone();
        async move {
            let mut watcher = backend.subscribe();
            while let Some(change) = watcher.changed().await {
                tracing::info!(event = ?change.event, "session changed");
                state.write().session = change.session;
            }
        }
    });

    // Keep the access token fresh
    let backend = platform.backend.clone();
    use_future(move || {
        let backend = backend.clone();
        async move {
            loop {
                sleep(REFRESH_CHECK_INTERVAL).await;
                let _ = refresh_if_needed(&backend, current_timestamp()).await;
            }
        }
    });

    rsx! {
        {children}
    }
}

async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
fn location_fragment() -> Option<String> {
    let hash = web_sys::window()?.location().hash().ok()?;
    (!hash.is_empty()).then_some(hash)
}

#[cfg(not(target_arch = "wasm32"))]
fn location_fragment() -> Option<String> {
    None
}

#[cfg(target_arch = "wasm32")]
fn clear_location_fragment() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash("");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn clear_location_fragment() {}
