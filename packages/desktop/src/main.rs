use dioxus::prelude::*;

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    use_context_provider(|| Signal::new(ui::ActivityLog::default()));

    // Desktop reads backend.toml from the working directory
    use_effect(|| {
        if let Ok(dir) = std::env::current_dir() {
            tracing::info!("Looking for backend configuration in {}", dir.display());
        }
    });

    rsx! {
        document::Link { rel: "stylesheet", href: ui::PROFILE_CSS }

        ui::SessionProvider {
            ui::Home {}
        }
    }
}
