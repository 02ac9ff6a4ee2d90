//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::browser::WebDriverConfig;
use crate::cache::CacheConfig;
use crate::session::SessionConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_STATIONS_FILE: &str = "data/stations.json";
pub const DEFAULT_ITINERARY_FILE: &str = "railpass.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RAILPASS_BIND {value:?} is not a socket address: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub webdriver: WebDriverConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub stations_file: PathBuf,
    pub itinerary_file: PathBuf,
    /// Serve searches from a scripted fixture instead of a real browser
    pub fixture: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup; unset or blank variables take defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let bind_str = var("RAILPASS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_str.clone(),
                source,
            })?;

        let mut webdriver = WebDriverConfig::default();
        if let Some(url) = var("RAILPASS_WEBDRIVER_URL") {
            webdriver = webdriver.with_endpoint(url);
        }

        Ok(Self {
            bind,
            webdriver,
            session: SessionConfig::default(),
            cache: CacheConfig::default(),
            stations_file: var("RAILPASS_STATIONS_FILE")
                .unwrap_or_else(|| DEFAULT_STATIONS_FILE.to_string())
                .into(),
            itinerary_file: var("RAILPASS_ITINERARY_FILE")
                .unwrap_or_else(|| DEFAULT_ITINERARY_FILE.to_string())
                .into(),
            fixture: var("RAILPASS_FIXTURE").map(PathBuf::from),
        })
    }
}
