//! Sign-in form: password sign-in, sign-up, or a magic link by e-mail.

use backend::{Backend, Credentials};
use dioxus::prelude::*;

use crate::activity_log::{log_activity, use_activity_log, Action, LogLevel};
use crate::session::use_platform;

/// What submitting the form does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
    MagicLink,
}

impl AuthMode {
    pub fn needs_password(self) -> bool {
        !matches!(self, AuthMode::MagicLink)
    }

    fn submit_label(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign in",
            AuthMode::SignUp => "Sign up",
            AuthMode::MagicLink => "Send magic link",
        }
    }
}

/// How a successful submission ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A session exists now; the page switches to the profile form.
    SignedIn,
    /// Nothing to do until the user follows the link in their inbox.
    CheckEmail(String),
}

/// Check the form before anything is sent.
pub fn validate(mode: AuthMode, email: &str, password: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err("Please enter a valid email".to_string());
    }
    if mode.needs_password() && password.is_empty() {
        return Err("Please enter your password".to_string());
    }
    Ok(())
}

/// Validate and perform one sign-in attempt.
pub async fn submit<B: Backend>(
    backend: &B,
    mode: AuthMode,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, String> {
    validate(mode, email, password)?;
    let credentials = Credentials::new(email, password);

    match mode {
        AuthMode::SignIn => backend
            .sign_in_with_password(&credentials)
            .await
            .map(|_| AuthOutcome::SignedIn),
        AuthMode::SignUp => backend.sign_up(&credentials).await.map(|session| match session {
            Some(_) => AuthOutcome::SignedIn,
            None => AuthOutcome::CheckEmail(format!(
                "Check {} for a confirmation link",
                credentials.email
            )),
        }),
        AuthMode::MagicLink => backend
            .send_magic_link(&credentials.email)
            .await
            .map(|_| AuthOutcome::CheckEmail(format!("Check {} for your login link", credentials.email))),
    }
    .map_err(|e| e.to_string())
}

/// Sign-in form shown while there is no session.
#[component]
pub fn Auth() -> Element {
    let platform = use_platform();
    let mut log = use_activity_log();
    let mut mode = use_signal(|| AuthMode::SignIn);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut notice = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);
    let offline = platform.backend.is_offline();

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = platform.backend.clone();
        spawn(async move {
            error.set(None);
            notice.set(None);
            loading.set(true);
            match submit(&backend, mode(), &email(), &password()).await {
                Ok(AuthOutcome::SignedIn) => {
                    password.set(String::new());
                    log_activity(&mut log, LogLevel::Success, Action::SignIn, "Signed in");
                }
                Ok(AuthOutcome::CheckEmail(message)) => {
                    log_activity(&mut log, LogLevel::Info, Action::SignIn, &message);
                    notice.set(Some(message));
                }
                Err(message) => {
                    log_activity(&mut log, LogLevel::Warning, Action::SignIn, &message);
                    error.set(Some(message));
                }
            }
            loading.set(false);
        });
    };

    let mut switch_to = move |next: AuthMode| {
        mode.set(next);
        error.set(None);
        notice.set(None);
    };

    let subtitle = match mode() {
        AuthMode::SignIn => "Sign in with your email and password",
        AuthMode::SignUp => "Create an account",
        AuthMode::MagicLink => "Get a sign-in link by email",
    };
    let submit_label = mode().submit_label();

    rsx! {
        div {
            class: "auth-card",

            h1 { class: "auth-title", "Avatar profile" }
            p { class: "auth-subtitle", "{subtitle}" }

            form {
                class: "auth-form",
                onsubmit: handle_submit,

                if let Some(err) = error() {
                    div { class: "form-error", "{err}" }
                }
                if let Some(msg) = notice() {
                    div { class: "form-notice", "{msg}" }
                }

                label { r#for: "auth-email", "Email" }
                input {
                    id: "auth-email",
                    r#type: "email",
                    placeholder: "Your email address",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                if mode().needs_password() {
                    label { r#for: "auth-password", "Password" }
                    input {
                        id: "auth-password",
                        r#type: "password",
                        placeholder: "Your password",
                        value: password(),
                        oninput: move |evt: FormEvent| password.set(evt.value()),
                    }
                }

                button {
                    class: "button block primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Loading..." } else { "{submit_label}" }
                }
            }

            div {
                class: "auth-switch",
                if mode() != AuthMode::SignIn {
                    button { class: "link", onclick: move |_| switch_to(AuthMode::SignIn), "Sign in with password" }
                }
                if mode() != AuthMode::SignUp {
                    button { class: "link", onclick: move |_| switch_to(AuthMode::SignUp), "Create an account" }
                }
                if mode() != AuthMode::MagicLink {
                    button { class: "link", onclick: move |_| switch_to(AuthMode::MagicLink), "Send me a magic link" }
                }
            }

            if offline {
                p {
                    class: "auth-offline",
                    "Offline demo: accounts only live in this window. Create one to try the profile page."
                }
            }
        }
    }
}
