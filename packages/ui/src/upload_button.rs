use dioxus::prelude::*;
use dioxus_free_icons::icons::fa_solid_icons::FaUpload;
use dioxus_free_icons::Icon;

use crate::profile::SelectedFile;

/// File picker for a new avatar.
///
/// Hands the first picked file to `on_upload`, or `None` when the selection was
/// empty or could not be read.
#[component]
pub fn UploadButton(uploading: bool, on_upload: EventHandler<Option<SelectedFile>>) -> Element {
    let handle_change = move |evt: FormEvent| async move {
        let file = match evt.files() {
            Some(engine) => match engine.files().into_iter().next() {
                Some(name) => engine
                    .read_file(&name)
                    .await
                    .map(|bytes| SelectedFile::new(&name, bytes)),
                None => None,
            },
            None => None,
        };
        if file.is_none() {
            tracing::warn!("No readable file in selection");
        }
        on_upload.call(file);
    };

    rsx! {
        div {
            class: "upload-button",
            label {
                class: "button primary block",
                r#for: "avatar-file",
                Icon { icon: FaUpload, width: 14, height: 14 }
                if uploading { " Uploading..." } else { " Upload an avatar" }
            }
            input {
                id: "avatar-file",
                r#type: "file",
                accept: "image/*",
                style: "visibility: hidden; position: absolute;",
                disabled: uploading,
                onchange: handle_change,
            }
        }
    }
}
