//! # Backend crate: client for the hosted auth and storage platform
//!
//! Everything the avatar profile app knows about its backend-as-a-service lives here.
//! The UI only ever talks to the [`Backend`] trait; which implementation sits behind
//! it is decided once at startup by [`AnyBackend::from_config`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | The [`Backend`] trait: session lifecycle, user metadata, object upload |
//! | [`config`] | [`BackendConfig`]: platform URL, anon key, avatars bucket |
//! | [`error`] | [`BackendError`] returned by every fallible call |
//! | [`http`] | [`HttpBackend`]: GoTrue-style auth and storage REST endpoints over `reqwest` |
//! | [`memory`] | [`MemoryBackend`]: in-process fake used by tests and the offline demo mode |
//! | [`models`] | Session, user and metadata types that cross the boundary |
//! | [`session`] | [`SessionState`] / [`SessionWatcher`]: session change broadcast |
//! | [`storage`] | Avatar object path convention |

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;
pub mod session;
pub mod storage;

mod any;
pub use any::AnyBackend;

pub use backend::Backend;
pub use config::BackendConfig;
pub use error::BackendError;
pub use http::HttpBackend;
pub use memory::{Call, MemoryBackend, Operation};
pub use models::{
    AuthEvent, AuthUser, Credentials, MetadataPatch, Session, SessionChange, UploadedObject,
    UserMetadata,
};
pub use session::{SessionState, SessionWatcher};
pub use storage::{avatar_file_name, file_extension, object_path, DEFAULT_AVATARS_BUCKET};
