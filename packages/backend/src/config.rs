//! # Backend configuration
//!
//! Where the hosted platform lives and which bucket avatars go to.
//!
//! ```toml
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//! avatars_bucket = "avatars"                 # optional
//! redirect_to = "http://localhost:8080/"     # optional, magic-link landing page
//! ```
//!
//! Native builds read this through [`BackendConfig::load`]: built-in defaults, then
//! an optional `backend.toml`, then `BACKEND_*` environment variables (a `.env`
//! file is honoured). Web builds cannot read files or the environment at runtime,
//! so [`BackendConfig::from_build_env`] bakes `BACKEND_URL` and `BACKEND_ANON_KEY`
//! in at compile time.
//!
//! An empty `url` means "not configured"; the app then runs against the in-memory
//! backend.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::storage::DEFAULT_AVATARS_BUCKET;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the platform project, without a trailing path.
    #[serde(default)]
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_avatars_bucket")]
    pub avatars_bucket: String,
    /// Where magic-link e-mails send the user back to.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

fn default_avatars_bucket() -> String {
    DEFAULT_AVATARS_BUCKET.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            avatars_bucket: default_avatars_bucket(),
            redirect_to: None,
        }
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    pub fn with_avatars_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.avatars_bucket = bucket.into();
        self
    }

    pub fn with_redirect_to(mut self, redirect_to: impl Into<String>) -> Self {
        self.redirect_to = Some(redirect_to.into());
        self
    }

    /// The well-known filename native builds look for.
    pub fn filename() -> &'static str {
        "backend.toml"
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Reject configurations the HTTP client cannot work with.
    pub fn validate(&self) -> Result<(), BackendError> {
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BackendError::Config(format!(
                "url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(BackendError::Config("anon_key is not set".to_string()));
        }
        if self.avatars_bucket.trim().is_empty() || self.avatars_bucket.contains('/') {
            return Err(BackendError::Config(format!(
                "invalid avatars bucket {:?}",
                self.avatars_bucket
            )));
        }
        Ok(())
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Values compiled into the binary from `BACKEND_*` build-time variables.
    pub fn from_build_env() -> Self {
        let mut config = Self::new(
            option_env!("BACKEND_URL").unwrap_or_default(),
            option_env!("BACKEND_ANON_KEY").unwrap_or_default(),
        );
        if let Some(bucket) = option_env!("BACKEND_AVATARS_BUCKET") {
            config.avatars_bucket = bucket.to_string();
        }
        config.redirect_to = option_env!("BACKEND_REDIRECT_TO").map(str::to_string);
        config
    }

    /// Layered runtime configuration: defaults, `backend.toml`, then environment.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Result<Self, BackendError> {
        dotenvy::dotenv().ok();
        Self::load_from(Self::filename())
    }

    /// Same as [`BackendConfig::load`] with an explicit (optional) TOML file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &str) -> Result<Self, BackendError> {
        use config::{Config, Environment, File, FileFormat};

        let settings = Config::builder()
            .set_default("avatars_bucket", DEFAULT_AVATARS_BUCKET)
            .map_err(|e| BackendError::Config(e.to_string()))?
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("BACKEND"))
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| BackendError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = BackendConfig::from_toml("").unwrap();
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.avatars_bucket, "avatars");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = BackendConfig::new("https://demo.example.co", "anon")
            .with_avatars_bucket("faces")
            .with_redirect_to("http://localhost:8080/");
        let text = config.to_toml().unwrap();
        assert_eq!(BackendConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validate() {
        assert!(BackendConfig::new("https://demo.example.co", "anon").validate().is_ok());
        assert!(BackendConfig::new("demo.example.co", "anon").validate().is_err());
        assert!(BackendConfig::new("https://demo.example.co", " ").validate().is_err());
        assert!(BackendConfig::new("https://demo.example.co", "anon")
            .with_avatars_bucket("a/b")
            .validate()
            .is_err());
    }

    #[test]
    fn test_load_from_environment() {
        std::env::set_var("BACKEND_URL", "https://env.example.co");
        std::env::set_var("BACKEND_ANON_KEY", "env-key");
        let config = BackendConfig::load_from("no-such-backend-config.toml").unwrap();
        std::env::remove_var("BACKEND_URL");
        std::env::remove_var("BACKEND_ANON_KEY");

        assert_eq!(config.url, "https://env.example.co");
        assert_eq!(config.anon_key, "env-key");
        assert_eq!(config.avatars_bucket, "avatars");
        assert!(config.is_configured());
    }
}
