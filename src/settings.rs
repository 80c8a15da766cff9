//! Client settings for talking to the external document processor.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Tracing target for settings resolution.
pub const TRACING_TARGET: &str = "docflow::settings";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_FLOW_PATH: &str = "/api/v1/process-flow/";
pub const DEFAULT_DOCUMENT_PATH: &str = "/api/v1/process-document/";
pub const DEFAULT_HEALTH_PATH: &str = "/api/v1/health";
pub const DEFAULT_FORMATS_PATH: &str = "/api/v1/supported-formats";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "DOCFLOW_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "DOCFLOW_TIMEOUT_SECS";

/// Where the processor lives and how requests to it are made.
///
/// `timeout` and `user_agent` are optional; use [`effective_timeout`] and
/// [`effective_user_agent`] to read them with their defaults applied.
///
/// [`effective_timeout`]: ClientSettings::effective_timeout
/// [`effective_user_agent`]: ClientSettings::effective_user_agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub base_url: Url,
    pub flow_path: String,
    pub document_path: String,
    pub health_path: String,
    #[serde(default = "default_formats_path")]
    pub formats_path: String,
    #[serde(default, with = "optional_secs")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            flow_path: DEFAULT_FLOW_PATH.to_string(),
            document_path: DEFAULT_DOCUMENT_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            formats_path: default_formats_path(),
            timeout: None,
            user_agent: None,
        }
    }
}

fn default_base_url() -> Url {
    match Url::parse(DEFAULT_BASE_URL) {
        Ok(url) => url,
        Err(_) => unreachable!("{} is a valid URL literal", DEFAULT_BASE_URL),
    }
}

fn default_formats_path() -> String {
    DEFAULT_FORMATS_PATH.to_string()
}

impl ClientSettings {
    /// Settings pointing at `base_url` with the default endpoint paths.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// Reads `DOCFLOW_API_URL` and `DOCFLOW_TIMEOUT_SECS`, keeping defaults for
    /// anything absent or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_API_URL) {
            match Url::parse(raw.trim()) {
                Ok(url) => settings.base_url = url,
                Err(err) => tracing::warn!(
                    target: TRACING_TARGET,
                    value = %raw,
                    error = %err,
                    "Ignoring invalid {}", ENV_API_URL
                ),
            }
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.timeout = Some(Duration::from_secs(secs)),
                _ => tracing::warn!(
                    target: TRACING_TARGET,
                    value = %raw,
                    "Ignoring invalid {}", ENV_TIMEOUT_SECS
                ),
            }
        }
        settings
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("docflow/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn flow_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.flow_path)
    }

    pub fn document_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.document_path)
    }

    pub fn health_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.health_path)
    }

    pub fn formats_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.formats_path)
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
