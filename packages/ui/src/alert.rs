//! Blocking alert dialog.

use dioxus::prelude::*;

/// Show `message` in the webview's native `alert()` dialog.
pub fn alert(message: &str) {
    let Ok(quoted) = serde_json::to_string(message) else {
        return;
    };
    let _ = document::eval(&format!("window.alert({quoted});"));
}
