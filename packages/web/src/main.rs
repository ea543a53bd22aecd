use dioxus::prelude::*;

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    use_context_provider(|| Signal::new(ui::ActivityLog::default()));

    use_effect(|| tracing::info!("Profile page mounted"));

    rsx! {
        document::Title { "Avatar profile" }
        document::Link { rel: "stylesheet", href: ui::PROFILE_CSS }

        ui::SessionProvider {
            ui::Home {}
        }
    }
}
