//! In-page record of what the profile page did.
//!
//! Each entry is tagged with the [`Action`] that produced it, so the form can
//! ask for the outcome of its latest upload and the panel can label entries.
//! Everything logged here also goes to `tracing`. Only the newest
//! [`MAX_ENTRIES`] entries are kept.

use std::collections::VecDeque;

use dioxus::prelude::*;

pub const MAX_ENTRIES: usize = 50;

/// The page action an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SignIn,
    Profile,
    Upload,
    SignOut,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::SignIn => "sign-in",
            Action::Profile => "profile",
            Action::Upload => "avatar",
            Action::SignOut => "sign-out",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub action: Action,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    pub visible: bool,
    /// Panel shows failures only.
    pub errors_only: bool,
}

impl ActivityLog {
    pub fn push(&mut self, level: LogLevel, action: Action, message: &str) {
        if self.entries.len() == MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp: current_time(),
            level,
            action,
            message: message.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .count()
    }

    /// Entries the panel shows, newest first.
    pub fn shown(&self) -> Vec<LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !self.errors_only || e.level == LogLevel::Error)
            .cloned()
            .collect()
    }

    /// The latest entry for `action`, if that entry is an error.
    pub fn last_failure(&self, action: Action) -> Option<&LogEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.action == action)
            .filter(|e| e.level == LogLevel::Error)
    }
}

pub fn use_activity_log() -> Signal<ActivityLog> {
    use_context::<Signal<ActivityLog>>()
}

pub fn log_activity(log: &mut Signal<ActivityLog>, level: LogLevel, action: Action, message: &str) {
    let action_label = action.label();
    match level {
        LogLevel::Error => tracing::error!(action = action_label, "{message}"),
        LogLevel::Warning => tracing::warn!(action = action_label, "{message}"),
        LogLevel::Info | LogLevel::Success => tracing::info!(action = action_label, "{message}"),
    }
    log.write().push(level, action, message);
}

#[cfg(target_arch = "wasm32")]
fn current_time() -> String {
    let date = js_sys::Date::new_0();
    let h = date.get_hours();
    let m = date.get_minutes();
    let s = date.get_seconds();
    format!("{h:02}:{m:02}:{s:02}")
}

/// UTC wall-clock time.
#[cfg(not(target_arch = "wasm32"))]
fn current_time() -> String {
    let secs = backend::session::current_timestamp().rem_euclid(86_400);
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
