//! This crate contains all shared UI for the workspace.

use dioxus::prelude::*;

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

pub const PROFILE_CSS: Asset = asset!("/src/profile.css");

pub mod profile;
pub use profile::{follow_session, ProfileFields, Screen, SelectedFile, UploadError};

mod session;
pub use session::{
    make_platform, needs_refresh, refresh_if_needed, use_platform, use_session, Platform,
    SessionProvider, SessionView,
};

mod alert;
pub use alert::alert;

mod auth;
pub use auth::{Auth, AuthMode, AuthOutcome};

mod avatar;
pub use avatar::Avatar;

mod upload_button;
pub use upload_button::UploadButton;

mod profile_form;
pub use profile_form::ProfileForm;

mod home;
pub use home::Home;

pub mod activity_log;
pub use activity_log::{log_activity, use_activity_log, Action, ActivityLog, LogLevel};

mod activity_log_panel;
pub use activity_log_panel::{ActivityLogPanel, ActivityLogToggle};
