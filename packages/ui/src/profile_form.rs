use dioxus::prelude::*;

use crate::activity_log::{log_activity, use_activity_log, Action, LogLevel};
use crate::alert::alert;
use crate::avatar::Avatar;
use crate::profile::{self, ProfileFields, SelectedFile};
use crate::session::use_platform;
use crate::upload_button::UploadButton;

/// Editable profile of the signed-in user.
#[component]
pub fn ProfileForm(email: String, fields: Signal<ProfileFields>) -> Element {
    let platform = use_platform();
    let mut log = use_activity_log();
    let mut uploading = use_signal(|| false);
    let mut saving = use_signal(|| false);

    let upload_error = log()
        .last_failure(Action::Upload)
        .map(|entry| entry.message.clone());
    let avatar_src = profile::avatar_url(
        &platform.backend,
        &platform.avatars_bucket,
        fields().avatar.as_deref(),
    );

    let upload_platform = platform.clone();
    let handle_upload = move |file: Option<SelectedFile>| {
        let platform = upload_platform.clone();
        spawn(async move {
            uploading.set(true);
            log_activity(&mut log, LogLevel::Info, Action::Upload, "Uploading avatar");
            match profile::upload_avatar(&platform.backend, &platform.avatars_bucket, file).await {
                Ok(avatar) => {
                    fields.write().avatar = Some(avatar);
                    log_activity(&mut log, LogLevel::Success, Action::Upload, "Avatar uploaded");
                }
                Err(e) => {
                    let message = e.to_string();
                    log_activity(&mut log, LogLevel::Error, Action::Upload, &message);
                    alert(&message);
                }
            }
            uploading.set(false);
        });
    };

    let update_platform = platform.clone();
    let handle_update = move |_: MouseEvent| {
        let backend = update_platform.backend.clone();
        spawn(async move {
            saving.set(true);
            match profile::update_profile(&backend, &fields()).await {
                Ok(()) => log_activity(&mut log, LogLevel::Success, Action::Profile, "Profile updated"),
                Err(e) => log_activity(
                    &mut log,
                    LogLevel::Error,
                    Action::Profile,
                    &format!("Failed to update profile: {e}"),
                ),
            }
            saving.set(false);
        });
    };

    let handle_sign_out = move |_: MouseEvent| {
        let backend = platform.backend.clone();
        spawn(async move {
            match profile::sign_out(&backend).await {
                Ok(()) => log_activity(&mut log, LogLevel::Info, Action::SignOut, "Signed out"),
                Err(e) => log_activity(
                    &mut log,
                    LogLevel::Error,
                    Action::SignOut,
                    &format!("Error logging out: {e}"),
                ),
            }
        });
    };

    rsx! {
        div {
            class: "form-widget",

            Avatar { url: avatar_src }
            UploadButton { uploading: uploading(), on_upload: handle_upload }
            if let Some(err) = upload_error {
                div { class: "form-error", "{err}" }
            }

            div {
                label { r#for: "email", "Email" }
                input { id: "email", r#type: "text", value: "{email}", disabled: true }
            }
            div {
                label { r#for: "username", "Username" }
                input {
                    id: "username",
                    r#type: "text",
                    value: fields().username.unwrap_or_default(),
                    oninput: move |evt: FormEvent| {
                        let value = evt.value();
                        fields.write().username = (!value.is_empty()).then_some(value);
                    },
                }
            }
            div {
                label { r#for: "dob", "Date of birth" }
                input {
                    id: "dob",
                    r#type: "date",
                    value: fields().dob.unwrap_or_default(),
                    oninput: move |evt: FormEvent| {
                        let value = evt.value();
                        fields.write().dob = (!value.is_empty()).then_some(value);
                    },
                }
            }

            div {
                button {
                    class: "button block primary",
                    disabled: saving(),
                    onclick: handle_update,
                    if saving() { "Loading ..." } else { "Update profile" }
                }
            }
            div {
                button { class: "button block", onclick: handle_sign_out, "Sign Out" }
            }
        }
    }
}
