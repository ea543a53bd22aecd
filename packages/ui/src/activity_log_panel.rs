use dioxus::prelude::*;

use crate::activity_log::{use_activity_log, LogLevel};

fn entry_class(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "activity-log-entry error",
        LogLevel::Warning => "activity-log-entry warning",
        LogLevel::Success => "activity-log-entry success",
        LogLevel::Info => "activity-log-entry info",
    }
}

/// Floating list of what the page did, newest first.
#[component]
pub fn ActivityLogPanel() -> Element {
    let mut log = use_activity_log();
    let current = log();
    if !current.visible {
        return rsx! {};
    }

    let shown = current.shown();
    let nothing_shown = shown.is_empty();
    let errors_only = current.errors_only;
    let empty_text = if errors_only { "No failures." } else { "Nothing happened yet." };

    rsx! {
        div {
            class: "activity-log-panel",
            div {
                class: "activity-log-header",
                span { "Activity" }
                div {
                    class: "activity-log-header-actions",
                    button {
                        class: if errors_only { "active" } else { "" },
                        onclick: move |_| log.write().errors_only = !errors_only,
                        "Errors only"
                    }
                    button { onclick: move |_| log.write().clear(), "Clear" }
                    button { onclick: move |_| log.write().visible = false, "Close" }
                }
            }
            div {
                class: "activity-log-entries",
                if nothing_shown {
                    div { class: "activity-log-empty", "{empty_text}" }
                }
                for entry in shown {
                    div {
                        class: entry_class(entry.level),
                        span { class: "activity-log-time", "{entry.timestamp}" }
                        span { class: "activity-log-action", {entry.action.label()} }
                        span { "{entry.message}" }
                    }
                }
            }
        }
    }
}

/// Button that opens the panel; shows the failure count when there are any.
#[component]
pub fn ActivityLogToggle() -> Element {
    let mut log = use_activity_log();
    let errors = log().error_count();
    let visible = log().visible;

    rsx! {
        button {
            class: if errors > 0 { "activity-log-toggle has-errors" } else { "activity-log-toggle" },
            onclick: move |_| log.write().visible = !visible,
            title: "Activity",
            if errors > 0 {
                "{errors} failed"
            } else {
                "Activity"
            }
        }
    }
}
