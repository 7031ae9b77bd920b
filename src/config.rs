//! Source configuration loaded from TOML.
//!
//! ```toml
//! endpoint = "https://api.example.com/v1"
//! query_param = "query"
//! format = "json-lines"
//! timeout_ms = 5000
//! user_agent = "reports/1.0"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::decode::{Decode, JsonArray, JsonLines};
use crate::transport::TransportError;

/// Endpoint used when no configuration names one.
pub const DEFAULT_ENDPOINT: &str = "http://api.example.com/v1";
/// Query parameter carrying the rendered query text.
pub const DEFAULT_QUERY_PARAM: &str = "query";

/// Payload format returned by the endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadFormat {
    /// A single JSON array of records.
    #[default]
    Json,
    /// One JSON record per line.
    JsonLines,
}

impl PayloadFormat {
    /// Decoder for this format.
    pub fn decoder(self) -> Arc<dyn Decode> {
        match self {
            PayloadFormat::Json => Arc::new(JsonArray),
            PayloadFormat::JsonLines => Arc::new(JsonLines),
        }
    }
}

/// Where and how rendered queries are sent.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base endpoint; the query parameter is appended to it.
    pub endpoint: String,
    /// Name of the query parameter carrying the rendered text.
    pub query_param: String,
    /// Payload format of responses.
    pub format: PayloadFormat,
    /// HTTP timeout. No timeout is enforced when absent.
    pub timeout_ms: Option<u64>,
    /// User agent sent by the HTTP transport.
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            query_param: DEFAULT_QUERY_PARAM.to_owned(),
            format: PayloadFormat::Json,
            timeout_ms: None,
            user_agent: None,
        }
    }
}

impl SourceConfig {
    /// Loads configuration from `explicit`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => read_file(&path),
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SourceConfig =
            toml::from_str(text).map_err(|source| ConfigError::ParseText { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_param.trim().is_empty() {
            return Err(ConfigError::EmptyQueryParam);
        }
        self.endpoint_url().map(|_| ())
    }

    /// Parsed endpoint.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(&self.endpoint).map_err(|err| invalid(err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("cannot carry query parameters".to_owned()));
        }
        Ok(url)
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn read_file(path: &Path) -> Result<SourceConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SourceConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// `<config dir>/querywire/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("querywire").join("config.toml"))
}

/// Errors raised while loading a [`SourceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Config file is not valid TOML for [`SourceConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// Config text is not valid TOML for [`SourceConfig`].
    #[error("failed to parse config: {source}")]
    ParseText {
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// `query_param` is blank.
    #[error("query_param must not be empty")]
    EmptyQueryParam,
    /// Endpoint is not a URL that can carry query parameters.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Offending endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Transport could not be built from the configuration.
    #[error("failed to build transport: {source}")]
    Transport {
        /// Underlying transport error.
        source: TransportError,
    },
}
