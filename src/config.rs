use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "RxLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the API server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Default base URL of the generative vision API.
pub const DEFAULT_VISION_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Default vision model used for prescription extraction.
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";

/// Default base URL of the openFDA drug API.
pub const DEFAULT_FDA_URL: &str = "https://api.fda.gov/drug";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,rxlens=debug"
}

/// Get the application data directory.
/// ~/RxLens/ on all platforms, unless RXLENS_DATA_DIR overrides it.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RXLENS_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("RxLens")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddr(String),
}

/// Runtime configuration, resolved from environment variables at startup.
///
/// The vision API key is optional at boot: the server still starts without
/// one, and analysis requests fail with the key-configuration error instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub vision_api_key: Option<String>,
    pub vision_base_url: String,
    pub vision_model: String,
    pub fda_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind = std::env::var("RXLENS_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind))?;

        Ok(Self {
            bind_addr,
            data_dir: app_data_dir(),
            vision_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            vision_base_url: std::env::var("RXLENS_VISION_URL")
                .unwrap_or_else(|_| DEFAULT_VISION_URL.to_string()),
            vision_model: std::env::var("RXLENS_VISION_MODEL")
                .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string()),
            fda_base_url: std::env::var("RXLENS_FDA_URL")
                .unwrap_or_else(|_| DEFAULT_FDA_URL.to_string()),
        })
    }

    /// Path of the SQLite database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rxlens.db")
    }
}
