use dioxus::prelude::*;
use dioxus_free_icons::icons::fa_solid_icons::FaUser;
use dioxus_free_icons::Icon;

/// Round profile picture, or a placeholder when there is none.
#[component]
pub fn Avatar(url: Option<String>, #[props(default = 150)] size: u32) -> Element {
    let style = format!("width: {size}px; height: {size}px;");

    match url {
        Some(src) => rsx! {
            img {
                class: "avatar image",
                style: "{style}",
                src: "{src}",
                alt: "Avatar",
            }
        },
        None => rsx! {
            div {
                class: "avatar no-image",
                style: "{style}",
                Icon { icon: FaUser, width: size / 2, height: size / 2 }
            }
        },
    }
}
