use std::ops::ControlFlow;

use dioxus::prelude::*;

use crate::activity_log::{log_activity, use_activity_log, Action, LogLevel};
use crate::activity_log_panel::{ActivityLogPanel, ActivityLogToggle};
use crate::auth::Auth;
use crate::profile::{self, ProfileFields, Screen};
use crate::profile_form::ProfileForm;
use crate::session::{use_platform, use_session};

/// The single page: sign-in form or profile form, depending on the session.
#[component]
pub fn Home() -> Element {
    let platform = use_platform();
    let session = use_session();
    let mut log = use_activity_log();
    let mut fields = use_signal(ProfileFields::default);

    // Load the profile now and again after every session change
    let backend = platform.backend.clone();
    use_future(move || {
        let backend = backend.clone();
        async move {
            profile::follow_session(&backend, |loaded| {
                match loaded {
                    Ok(loaded) => fields.set(loaded),
                    Err(e) => log_activity(
                        &mut log,
                        LogLevel::Error,
                        Action::Profile,
                        &format!("Failed to load profile: {e}"),
                    ),
                }
                ControlFlow::Continue(())
            })
            .await;
        }
    });

    let view = session();
    let body = if view.loading {
        rsx! { div { class: "loading", "Loading..." } }
    } else {
        match (Screen::for_session(view.session.as_ref()), view.session) {
            (Screen::Profile, Some(session)) => rsx! {
                ProfileForm {
                    email: session.user.email.clone().unwrap_or_default(),
                    fields,
                }
            },
            _ => rsx! { Auth {} },
        }
    };

    rsx! {
        div {
            class: "container",
            if view.offline {
                div { class: "offline-banner", "Offline demo" }
            }
            {body}
        }
        ActivityLogToggle {}
        ActivityLogPanel {}
    }
}
