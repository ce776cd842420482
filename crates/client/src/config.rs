// Client configuration file.
//
// Global config: `~/.flame/config.toml`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::operation::OperationKind;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7800/rpc";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const UNIX_SCHEME_PREFIX: &str = "unix://";
const FIXTURE_ENDPOINT: &str = "fixture";

/// Root directory for Flame client state: `~/.flame/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".flame"))
}

/// Path to the config file: `~/.flame/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

// ── Client config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Service endpoint: an `http(s)://` URL, `unix:///path/to.sock`, or `fixture`.
    pub endpoint: String,
    /// Per-operation deadlines.
    pub timeouts: TimeoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), timeouts: TimeoutConfig::default() }
    }
}

impl ClientConfig {
    /// Load from `~/.flame/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::parse(&self.endpoint)
    }
}

/// Deadlines in milliseconds. `0` disables the deadline; unset per-operation
/// values fall back to `default_ms`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub default_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_login_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_projects_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_directory_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_file_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_ms: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_TIMEOUT_MS,
            check_login_ms: None,
            list_projects_ms: None,
            list_directory_ms: None,
            read_file_ms: None,
            search_ms: None,
        }
    }
}

impl TimeoutConfig {
    /// Same deadline for every operation.
    pub fn uniform(ms: u64) -> Self {
        Self { default_ms: ms, ..Self::default() }
    }

    pub fn timeout_for(&self, kind: OperationKind) -> Option<Duration> {
        let specific = match kind {
            OperationKind::CheckLogin => self.check_login_ms,
            OperationKind::ListProjects => self.list_projects_ms,
            OperationKind::ListDirectory => self.list_directory_ms,
            OperationKind::ReadFile => self.read_file_ms,
            OperationKind::Search => self.search_ms,
        };
        match specific.unwrap_or(self.default_ms) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

// ── Endpoint ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Http(Url),
    Socket(PathBuf),
    /// Built-in sample data, no network.
    Fixture,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let input = input.trim();
        if input == FIXTURE_ENDPOINT {
            return Ok(Self::Fixture);
        }
        if let Some(path) = input.strip_prefix(UNIX_SCHEME_PREFIX) {
            if path.is_empty() {
                return Err(ConfigError::Endpoint(format!("`{input}` has no socket path")));
            }
            return Ok(Self::Socket(PathBuf::from(path)));
        }

        let url = Url::parse(input)
            .map_err(|error| ConfigError::Endpoint(format!("`{input}`: {error}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            other => Err(ConfigError::Endpoint(format!("unsupported scheme `{other}` in `{input}`"))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::Socket(path) => write!(f, "{UNIX_SCHEME_PREFIX}{}", path.display()),
            Self::Fixture => f.write_str(FIXTURE_ENDPOINT),
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid endpoint {0}")]
    Endpoint(String),
}
