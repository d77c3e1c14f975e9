use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use facesync_core::client::DEFAULT_MAX_CANDIDATES;

/// Pipeline configuration.
///
/// Read-only after initialization; everything the handlers need beyond
/// their collaborators lives here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the recognition REST service.
    pub endpoint: String,
    /// Subscription key sent with every request.
    pub api_key: String,
    /// Identifier of the single person group (stable per deployment).
    pub group_id: String,
    /// Display name used when the group is first created.
    pub group_name: String,
    /// Candidate cap per detected face on identify calls.
    pub max_candidates: u8,
    /// Timeout for one remote call.
    pub request_timeout_secs: u64,
    /// Root directory the media file paths are relative to.
    pub media_root: PathBuf,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting `{0}` (set {1})")]
    Missing(&'static str, &'static str),
    #[error("unreadable config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Optional TOML file underneath the environment (same keys, snake_case).
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    endpoint: Option<String>,
    api_key: Option<String>,
    group_id: Option<String>,
    group_name: Option<String>,
    max_candidates: Option<u8>,
    request_timeout_secs: Option<u64>,
    media_root: Option<PathBuf>,
}

const DEFAULT_GROUP_ID: &str = "members";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Config {
    /// Load configuration from `FACESYNC_*` environment variables, with an
    /// optional TOML file (`FACESYNC_CONFIG`) supplying defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("FACESYNC_CONFIG") {
            Ok(path) => read_file(PathBuf::from(path))?,
            Err(_) => FileConfig::default(),
        };
        Self::from_sources(file)
    }

    fn from_sources(file: FileConfig) -> Result<Self, ConfigError> {
        let endpoint = env_string("FACESYNC_ENDPOINT")
            .or(file.endpoint)
            .ok_or(ConfigError::Missing("endpoint", "FACESYNC_ENDPOINT"))?;
        let api_key = env_string("FACESYNC_API_KEY")
            .or(file.api_key)
            .ok_or(ConfigError::Missing("api_key", "FACESYNC_API_KEY"))?;
        let group_id = env_string("FACESYNC_GROUP")
            .or(file.group_id)
            .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string());
        let group_name = env_string("FACESYNC_GROUP_NAME")
            .or(file.group_name)
            .unwrap_or_else(|| group_id.clone());

        Ok(Self {
            endpoint,
            api_key,
            group_name,
            max_candidates: env_parse("FACESYNC_MAX_CANDIDATES")
                .or(file.max_candidates)
                .unwrap_or(DEFAULT_MAX_CANDIDATES),
            request_timeout_secs: env_parse("FACESYNC_TIMEOUT_SECS")
                .or(file.request_timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            media_root: env_string("FACESYNC_MEDIA_ROOT")
                .map(PathBuf::from)
                .or(file.media_root)
                .unwrap_or_else(|| PathBuf::from(".")),
            group_id,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn read_file(path: PathBuf) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Malformed { path, source })
}

/// Non-empty environment string, `None` otherwise.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
