//! Connection settings for the ERCx API.
//!
//! `ClientConfig` is built once and then owned by the dispatcher. It can come
//! from code, from the `ERCX_API_URL` / `ERCX_API_KEY` environment variables,
//! or from a `config.ini` file laid out as:
//!
//! ```ini
//! [URLs]
//! ERCx_API_URL = https://ercx.runtimeverification.com/api/v1/
//!
//! [Keys]
//! ERCx_API_KEY = <your key>
//! ```
//!
//! The url is used as a plain prefix: endpoints are appended to it verbatim,
//! so it normally ends with `/`.

use std::fmt;
use std::path::Path;

use ini::Ini;
use tracing::debug;

use crate::error::{ApiError, Result};

pub const ENV_API_URL: &str = "ERCX_API_URL";
pub const ENV_API_KEY: &str = "ERCX_API_KEY";

const INI_URL_SECTION: &str = "URLs";
const INI_URL_KEY: &str = "ERCx_API_URL";
const INI_KEY_SECTION: &str = "Keys";
const INI_KEY_KEY: &str = "ERCx_API_KEY";

/// Base url and API key of the service.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_url: String,
    api_key: String,
}

impl ClientConfig {
    /// Validate and build a config.
    ///
    /// Fails if either value is blank or the url is not http(s).
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_url = api_url.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();

        if api_url.is_empty() {
            return Err(ApiError::config("api url is missing"));
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ApiError::config(format!(
                "api url must start with http:// or https://, got {api_url}"
            )));
        }
        if api_key.is_empty() {
            return Err(ApiError::config("api key is missing"));
        }

        Ok(Self { api_url, api_key })
    }

    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_API_URL)
            .map_err(|_| ApiError::config(format!("{ENV_API_URL} is not set")))?;
        let key = std::env::var(ENV_API_KEY)
            .map_err(|_| ApiError::config(format!("{ENV_API_KEY} is not set")))?;
        debug!(api_url = %url, "loaded client config from environment");
        Self::new(url, key)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_ini_str(&raw)?;
        debug!(path = %path.display(), api_url = %config.api_url, "loaded client config from file");
        Ok(config)
    }

    /// Parse the `[URLs]` / `[Keys]` INI layout.
    pub fn from_ini_str(raw: &str) -> Result<Self> {
        let ini = Ini::load_from_str(raw)
            .map_err(|e| ApiError::config(format!("malformed config file: {e}")))?;
        let url = ini
            .get_from(Some(INI_URL_SECTION), INI_URL_KEY)
            .ok_or_else(|| ApiError::config(format!("[{INI_URL_SECTION}] {INI_URL_KEY} is missing")))?;
        let key = ini
            .get_from(Some(INI_KEY_SECTION), INI_KEY_KEY)
            .ok_or_else(|| ApiError::config(format!("[{INI_KEY_SECTION}] {INI_KEY_KEY} is missing")))?;
        Self::new(url, key)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
